use crate::db::models::MAX_POST_LEN;
use crate::error::AppError;

const MAX_BIO_LEN: usize = 500;
const MAX_IMAGE_REF_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Validate and sanitize username
pub fn username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(AppError::Validation("Username must be 3-32 characters".to_string()));
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Username must be alphanumeric, underscore, or hyphen".to_string(),
        ));
    }

    // Convert to lowercase for consistency
    Ok(trimmed.to_lowercase())
}

pub fn email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(AppError::Validation("Enter a valid email address".to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn bio(bio: &str) -> Result<String, AppError> {
    let trimmed = bio.trim();
    if trimmed.chars().count() > MAX_BIO_LEN {
        return Err(AppError::Validation(format!(
            "Bio must be at most {} characters",
            MAX_BIO_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Post bodies are measured in chars, not bytes.
pub fn content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Post cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_POST_LEN {
        return Err(AppError::Validation(format!(
            "Post must be at most {} characters",
            MAX_POST_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// An image is a stored file reference such as `tweet_images/cat.png`.
pub fn image(image: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(image) = image.map(str::trim) else {
        return Ok(None);
    };

    let malformed = || AppError::Validation("Malformed image reference".to_string());

    if image.is_empty() || image.len() > MAX_IMAGE_REF_LEN || image.contains("..") {
        return Err(malformed());
    }
    if image.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(malformed());
    }

    let extension = image
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(malformed)?;
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported image type: .{}",
            extension
        )));
    }

    Ok(Some(image.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert_eq!(username("  Alice_01 ").unwrap(), "alice_01");
        assert!(username("ab").is_err());
        assert!(username("bad name").is_err());
        assert!(username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(email(" a@b.io ").unwrap(), "a@b.io");
        assert!(email("nope").is_err());
        assert!(email("@b.io").is_err());
        assert!(email("a@localhost").is_err());
        assert!(email("a@b@c.io").is_err());
    }

    #[test]
    fn test_content_bounds() {
        assert!(matches!(content("   "), Err(AppError::Validation(_))));
        assert_eq!(content(" hello ").unwrap(), "hello");

        // 280 multi-byte chars are fine, 281 are not
        assert!(content(&"é".repeat(280)).is_ok());
        assert!(content(&"é".repeat(281)).is_err());
    }

    #[test]
    fn test_image_reference() {
        assert_eq!(image(None).unwrap(), None);
        assert_eq!(image(Some("tweet_images/cat.PNG")).unwrap().as_deref(), Some("tweet_images/cat.PNG"));
        assert!(image(Some("")).is_err());
        assert!(image(Some("../etc/passwd.png")).is_err());
        assert!(image(Some("cat.exe")).is_err());
        assert!(image(Some("noextension")).is_err());
    }

    #[test]
    fn test_password_and_bio() {
        assert!(password("short").is_err());
        assert!(password("long enough").is_ok());
        assert!(bio(&"b".repeat(501)).is_err());
        assert_eq!(bio(" hi ").unwrap(), "hi");
    }
}
