use snafu::Snafu;

pub type CustomResult<T> = Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("could not fetch timing page {url}: {source}"))]
    FetchError { url: String, source: reqwest::Error },

    #[snafu(display("timing page {url} answered with status {status}"))]
    HttpStatusError { url: String, status: u16 },

    #[snafu(display("could not build http client: {source}"))]
    ClientBuildError { source: reqwest::Error },

    #[snafu(display("invalid lap time: {input:?}"))]
    InvalidLapTimeError { input: String },

    #[snafu(display("lap {lap_number} of kart {kart_id} does not follow lap {previous}"))]
    LapSequenceError {
        kart_id: String,
        lap_number: u32,
        previous: u32,
    },

    #[snafu(display("invalid value for {name}: {value:?}"))]
    InvalidSettingError { name: String, value: String },

    #[snafu(display("invalid row pattern: {source}"))]
    PatternError { source: regex::Error },

    #[snafu(display("could not read snapshot {path}: {source}"))]
    SnapshotFileError {
        path: String,
        source: std::io::Error,
    },
}
