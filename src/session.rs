//! Upload session: owns the decoded photo and everything derived from it.
//!
//! Decodes run on blocking tasks and cannot be cancelled; instead every
//! upload takes a generation ticket and a completion whose ticket is stale
//! (a newer upload began meanwhile) is discarded, so a slow decode can never
//! clobber newer state.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::card::compose::Compositor;
use crate::crop::editor::CropRect;
use crate::crop::extract;
use crate::error::Error;

/// The uploaded photo after decode, orientation-corrected. Immutable;
/// replaced wholesale by the next upload.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub image: Arc<RgbaImage>,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Ticket for one upload attempt; compared on completion to drop stale
/// decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    source: Option<SourceImage>,
    cropped: Option<Arc<RgbaImage>>,
    card: Option<Arc<RgbaImage>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new upload: bumps the generation and invalidates everything
    /// derived from the previous photo.
    pub fn begin_upload(&mut self) -> UploadTicket {
        self.generation += 1;
        self.source = None;
        self.cropped = None;
        self.card = None;
        UploadTicket {
            generation: self.generation,
        }
    }

    /// Install a decoded photo. Returns false (and drops the image) when the
    /// ticket is stale because a newer upload began after this one.
    pub fn complete_upload(&mut self, ticket: UploadTicket, source: SourceImage) -> bool {
        if ticket.generation != self.generation {
            debug!(
                path = %source.path.display(),
                stale = ticket.generation,
                current = self.generation,
                "discarding stale decode"
            );
            return false;
        }
        info!(
            path = %source.path.display(),
            width = source.width(),
            height = source.height(),
            "photo ready"
        );
        self.source = Some(source);
        true
    }

    /// Decode `path` and install it as the session photo.
    pub async fn load_photo(&mut self, path: &Path) -> Result<(), Error> {
        let ticket = self.begin_upload();
        let source = decode_photo(path).await?;
        self.complete_upload(ticket, source);
        Ok(())
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Extract the crop selected on a `canvas_w` x `canvas_h` viewport. The
    /// result supersedes any previous crop and invalidates the card.
    pub fn commit_crop(
        &mut self,
        rect: &CropRect,
        canvas_w: f32,
        canvas_h: f32,
    ) -> Result<Arc<RgbaImage>, Error> {
        let source = self.source.as_ref().ok_or(Error::NoPhoto)?;
        let cropped = Arc::new(extract::extract(&source.image, rect, canvas_w, canvas_h));
        self.cropped = Some(Arc::clone(&cropped));
        self.card = None;
        Ok(cropped)
    }

    /// Use the full photo without cropping.
    pub fn skip_crop(&mut self) -> Result<Arc<RgbaImage>, Error> {
        let source = self.source.as_ref().ok_or(Error::NoPhoto)?;
        let full = Arc::clone(&source.image);
        self.cropped = Some(Arc::clone(&full));
        self.card = None;
        Ok(full)
    }

    pub fn cropped(&self) -> Option<&Arc<RgbaImage>> {
        self.cropped.as_ref()
    }

    /// Run the compositor over the committed crop. On failure the previously
    /// generated card, if any, is left untouched.
    pub async fn generate_card(
        &mut self,
        compositor: &Compositor,
        name: Option<&str>,
    ) -> Result<Arc<RgbaImage>, Error> {
        let photo = Arc::clone(self.cropped.as_ref().ok_or(Error::NoPhoto)?);
        let mut rng = StdRng::from_os_rng();
        match compositor.compose(&photo, name, &mut rng).await {
            Ok(card) => {
                let card = Arc::new(card);
                self.card = Some(Arc::clone(&card));
                Ok(card)
            }
            Err(err) => Err(Error::Compose(err)),
        }
    }

    pub fn card(&self) -> Option<&Arc<RgbaImage>> {
        self.card.as_ref()
    }
}

/// Decode a photo on a blocking task, applying EXIF orientation.
pub async fn decode_photo(path: &Path) -> Result<SourceImage, Error> {
    let owned = path.to_path_buf();
    let image = tokio::task::spawn_blocking(move || decode_oriented(&owned)).await??;
    Ok(SourceImage {
        path: path.to_path_buf(),
        image: Arc::new(image),
    })
}

fn decode_oriented(path: &Path) -> Result<RgbaImage, Error> {
    let decoded = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    let rgba = decoded.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(Error::EmptyImage {
            path: path.to_path_buf(),
        });
    }
    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(rgba, orientation))
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0)? as u16;
    debug!(orientation = value, path = %path.display(), "exif orientation");
    Some(value)
}

/// Map the eight EXIF orientations onto flips/rotations. Unknown values
/// leave the raster as decoded.
pub(crate) fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops::{flip_horizontal, flip_vertical, rotate90, rotate180, rotate270};
    match orientation {
        2 => flip_horizontal(&img),
        3 => rotate180(&img),
        4 => flip_vertical(&img),
        5 => flip_horizontal(&rotate90(&img)),
        6 => rotate90(&img),
        7 => flip_horizontal(&rotate270(&img)),
        8 => rotate270(&img),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn source(tag: u8) -> SourceImage {
        SourceImage {
            path: PathBuf::from(format!("photo-{tag}.png")),
            image: Arc::new(RgbaImage::from_pixel(4, 4, Rgba([tag, 0, 0, 255]))),
        }
    }

    #[test]
    fn stale_upload_is_discarded() {
        let mut session = Session::new();
        let first = session.begin_upload();
        let second = session.begin_upload();

        // The slower first decode lands after the second upload began.
        assert!(!session.complete_upload(first, source(1)));
        assert!(session.source().is_none());

        assert!(session.complete_upload(second, source(2)));
        assert_eq!(session.source().unwrap().image.get_pixel(0, 0)[0], 2);
    }

    #[test]
    fn new_upload_invalidates_downstream_state() {
        let mut session = Session::new();
        let ticket = session.begin_upload();
        session.complete_upload(ticket, source(1));
        session.skip_crop().unwrap();
        assert!(session.cropped().is_some());

        session.begin_upload();
        assert!(session.source().is_none());
        assert!(session.cropped().is_none());
        assert!(session.card().is_none());
    }

    #[test]
    fn crop_without_photo_is_an_error() {
        let mut session = Session::new();
        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        };
        assert!(matches!(
            session.commit_crop(&rect, 400.0, 300.0),
            Err(Error::NoPhoto)
        ));
    }

    #[test]
    fn orientation_six_rotates_quarter_turn() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let turned = apply_orientation(img, 6);
        assert_eq!(turned.dimensions(), (1, 2));
        assert_eq!(turned.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn unknown_orientation_is_identity() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([7, 7, 7, 255]));
        let same = apply_orientation(img.clone(), 42);
        assert_eq!(img, same);
    }
}
