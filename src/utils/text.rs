
use std::borrow::Cow;
use std::path::Path;

use anyhow::{bail, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

/// Reads a whole text file.
///
/// A byte order mark decides the encoding when present (UTF-8, UTF-16LE/BE);
/// otherwise the content is taken as UTF-8 and, if that fails, decoded with
/// whatever encoding `chardetng` guesses.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => bail!("Could not read file {:?}\n -> {:?}", path, error),
    };
    Ok(decode_text(&bytes, path))
}

pub fn decode_text(bytes: &[u8], path: &Path) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        debug!("{:?} has a {} byte order mark", path, encoding.name());
        let (decoded, _, _) = encoding.decode(&bytes[bom_length..]);
        return decoded.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let encoding = detector.guess(None, true);
            debug!("{:?} is not UTF-8, decoding as {}", path, encoding.name());
            let (decoded, _, _): (Cow<str>, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Writes the text as UTF-8 (no byte order mark).
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let (encoded, _, _) = UTF_8.encode(content);
    if let Err(error) = std::fs::write(path, &encoded) {
        bail!("Could not write file {:?}\n -> {:?}", path, error);
    }
    Ok(())
}
