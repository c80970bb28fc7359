//! File persistence helpers over the byte codecs.

use crate::error::{self, Result};
use snafu::ResultExt;
use std::path::Path;

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).context(error::FileWrite { path })
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).context(error::FileRead { path })
}
