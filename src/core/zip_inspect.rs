//! Inspection des archives de photos uploadées: validation du format,
//! comptage des images et extraction de l'image de couverture.

use std::io::{Cursor, Read};

use crate::infrastructure::error::{AppError, AppResult};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Première image de l'archive, réutilisée comme couverture du modèle
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub file_name: String,
    pub extension: String,
    pub content: Vec<u8>,
}

/// Résultat de l'inspection d'une archive de photos
#[derive(Debug)]
pub struct ArchiveInspection {
    pub image_count: usize,
    pub cover: Option<CoverImage>,
}

/// Vérifie par détection magique que le contenu est bien une archive zip
pub fn ensure_zip(content: &[u8]) -> AppResult<()> {
    let infer = infer::Infer::new();
    let mime_type = infer
        .get(content)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    if mime_type != "application/zip" {
        return Err(AppError::UnsupportedMediaType(format!(
            "Archive zip attendue, reçu: {}",
            mime_type
        )));
    }

    Ok(())
}

/// Parcourt l'archive, compte les images et extrait la première comme
/// couverture. Les entrées répertoires et non-images sont ignorées.
pub fn inspect_photo_archive(content: &[u8]) -> AppResult<ArchiveInspection> {
    let cursor = Cursor::new(content);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut image_count = 0;
    let mut cover: Option<CoverImage> = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let file_name = entry.name().to_string();
        let Some(extension) = image_extension(&file_name) else {
            continue;
        };

        image_count += 1;

        if cover.is_none() {
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            cover = Some(CoverImage {
                file_name,
                extension: extension.to_string(),
                content: bytes,
            });
        }
    }

    Ok(ArchiveInspection { image_count, cover })
}

/// Extension d'image reconnue, en minuscules
fn image_extension(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit('.').next()?.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|&&ext| ext == extension)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);

            for (name, content) in entries {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_inspect_counts_images_and_picks_first_cover() {
        let content = build_zip(&[
            ("notes.txt", b"not an image"),
            ("IMG_001.jpg", b"jpeg bytes"),
            ("IMG_002.PNG", b"png bytes"),
            ("IMG_003.webp", b"webp bytes"),
        ]);

        let inspection = inspect_photo_archive(&content).unwrap();
        assert_eq!(inspection.image_count, 3);

        let cover = inspection.cover.unwrap();
        assert_eq!(cover.file_name, "IMG_001.jpg");
        assert_eq!(cover.extension, "jpg");
        assert_eq!(cover.content, b"jpeg bytes");
    }

    #[test]
    fn test_inspect_empty_archive() {
        let content = build_zip(&[("readme.md", b"no photos here")]);

        let inspection = inspect_photo_archive(&content).unwrap();
        assert_eq!(inspection.image_count, 0);
        assert!(inspection.cover.is_none());
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect_photo_archive(b"definitely not a zip").is_err());
    }

    #[test]
    fn test_ensure_zip() {
        let content = build_zip(&[("a.jpg", b"x")]);
        assert!(ensure_zip(&content).is_ok());
        assert!(ensure_zip(b"plain text content").is_err());
    }

    #[test]
    fn test_image_extension_case_insensitive() {
        assert_eq!(image_extension("photo.JPEG"), Some("jpeg"));
        assert_eq!(image_extension("photo.txt"), None);
        assert_eq!(image_extension("no_extension"), None);
    }
}
