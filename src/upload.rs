//! Reading `multipart/form-data` bodies and storing uploaded post images.
use gotham::state::{FromState, State};
use hyper::{header, HeaderMap};
use multipart::server::Multipart;
use rand::prelude::*;

use std::{
    fs,
    io::{Cursor, Read},
    path::Path,
};

/// Subdirectory of the media directory holding post images
pub const IMAGE_DIR: &str = "posts_images";

const NAME_LEN: usize = 16;

/// An uploaded file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    /// Name the file had on the uploader's machine
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    /// The file extension matching the image format, detected from the file's content.
    pub fn image_extension(&self) -> Option<&'static str> {
        let data = &self.data;
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some("png")
        } else if data.starts_with(b"\xff\xd8\xff") {
            Some("jpg")
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some("gif")
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some("webp")
        } else {
            None
        }
    }

    /// Writes the image under a fresh random name and returns its path relative to `media_dir`.
    pub fn save_image(&self, media_dir: &str) -> Result<String, failure::Error> {
        let extension = self
            .image_extension()
            .ok_or_else(|| failure::err_msg("not a supported image"))?;
        let directory = Path::new(media_dir).join(IMAGE_DIR);
        fs::create_dir_all(&directory)?;

        let name = format!("{}.{}", random_name(), extension);
        fs::write(directory.join(&name), &self.data)?;
        Ok(format!("{}/{}", IMAGE_DIR, name))
    }
}

fn random_name() -> String {
    let mut bytes = [0u8; NAME_LEN];
    StdRng::from_entropy().fill(&mut bytes[..]);
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// The multipart boundary of the request, if the body is `multipart/form-data`.
pub fn boundary(state: &State) -> Option<String> {
    let content_type: mime::Mime = HeaderMap::borrow_from(state)
        .get(header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    if content_type.type_() != mime::MULTIPART || content_type.subtype() != mime::FORM_DATA {
        return None;
    }
    content_type
        .get_param(mime::BOUNDARY)
        .map(|boundary| boundary.as_str().to_owned())
}

/// Splits a multipart body into its text fields and files.
///
/// File inputs left empty are submitted without content and are skipped.
pub fn read(
    body: &[u8],
    boundary: &str,
) -> Result<(Vec<(String, String)>, Vec<(String, Upload)>), failure::Error> {
    let mut multipart = Multipart::with_body(Cursor::new(body), boundary);
    let mut fields = Vec::new();
    let mut files = Vec::new();

    while let Some(mut entry) = multipart.read_entry()? {
        let name = entry.headers.name.to_string();
        let mut data = Vec::new();
        entry.data.read_to_end(&mut data)?;

        match entry.headers.filename.clone() {
            Some(filename) => {
                if !data.is_empty() {
                    files.push((name, Upload { filename, data }));
                }
            }
            None => fields.push((name, String::from_utf8(data)?)),
        }
    }
    Ok((fields, files))
}
