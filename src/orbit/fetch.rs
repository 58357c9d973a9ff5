//! HTTP product source for the CODE orbit archive.
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::Error;

use super::ProductSource;

/// Ultra-rapid product file name on the archive, served uncompressed.
const ULTRA_RAPID_FILE: &str = "COD.EPH_U";

/// Fetches orbit products from the CODE analysis center archive and
/// mirrors them in a local directory, so a process restart does not
/// re-download days already served.
pub struct CodArchive {
    base_url: String,
    files_dir: PathBuf,
    client: Client,
}

fn final_product_name(year: i32, day_of_year: u16) -> String {
    format!(
        "COD0OPSFIN_{:04}{:03}0000_01D_05M_ORB.SP3",
        year, day_of_year
    )
}

impl CodArchive {
    pub const DEFAULT_BASE_URL: &'static str = "http://ftp.aiub.unibe.ch/CODE";

    /// New archive client mirroring products under `files_dir`.
    pub fn new<P: AsRef<Path>>(files_dir: P) -> Result<Self, Error> {
        Self::with_base_url(files_dir, Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url<P: AsRef<Path>>(files_dir: P, base_url: &str) -> Result<Self, Error> {
        std::fs::create_dir_all(&files_dir)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            files_dir: files_dir.as_ref().to_path_buf(),
            client,
        })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!("downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotYetPublished);
        }
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(body.to_vec())
    }

    /// Stores a fetched product next to the others. A failed write
    /// removes the partial destination file before surfacing.
    fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        if let Err(e) = std::fs::write(path, bytes) {
            warn!("failed to store {}: {}", path.display(), e);
            if std::fs::remove_file(path).is_err() {
                debug!("no partial file to remove at {}", path.display());
            }
            return Err(Error::Io(e));
        }
        Ok(())
    }
}

impl ProductSource for CodArchive {
    fn fetch_final(&self, year: i32, day_of_year: u16) -> Result<Vec<u8>, Error> {
        let file_name = final_product_name(year, day_of_year);
        let local = self.files_dir.join(&file_name);

        if local.exists() {
            debug!("serving {} from local mirror", file_name);
            return Ok(std::fs::read(&local)?);
        }

        let url = format!("{}/{}/{}.gz", self.base_url, year, file_name);
        let compressed = self.download(&url)?;

        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut content = Vec::new();
        decoder
            .read_to_end(&mut content)
            .map_err(|e| Error::CorruptProduct(e.to_string()))?;

        self.store(&local, &content)?;
        info!("final orbit product {} fetched", file_name);
        Ok(content)
    }

    fn fetch_ultra_rapid(&self) -> Result<Vec<u8>, Error> {
        let url = format!("{}/{}", self.base_url, ULTRA_RAPID_FILE);
        let content = self.download(&url)?;
        self.store(&self.files_dir.join(ULTRA_RAPID_FILE), &content)?;
        Ok(content)
    }
}
