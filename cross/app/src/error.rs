#![deny(unsafe_code)]

#[derive(Debug)]
pub enum Error {
    Sonar(sonar::Error),
}

impl From<sonar::Error> for Error {
    fn from(sonar_error: sonar::Error) -> Self {
        Error::Sonar(sonar_error)
    }
}
