use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageDataError {
    #[error("image data is empty")]
    Empty,
    #[error("invalid base64 image data")]
    Base64(#[from] base64::DecodeError),
}

/// Decode a submitted camera frame: a data URL
/// (`data:image/jpeg;base64,...`) or bare base64.
pub fn decode_image_data(image_data: &str) -> Result<Vec<u8>, ImageDataError> {
    let payload = match image_data.split_once(',') {
        Some((_, rest)) => rest,
        None => image_data,
    };
    if payload.trim().is_empty() {
        return Err(ImageDataError::Empty);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_data_url_prefix() {
        let decoded = decode_image_data("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_accepts_bare_base64() {
        let decoded = decode_image_data("aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert!(matches!(
            decode_image_data("data:image/jpeg;base64,"),
            Err(ImageDataError::Empty)
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode_image_data("data:image/jpeg;base64,!!!").is_err());
    }
}
