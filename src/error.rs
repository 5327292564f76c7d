use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unable to decode exposition payload: {0}")]
    Parse(#[source] std::io::Error),
}
