//! Remote photo service boundary
//!
//! [`RemoteApi`] is the narrow contract the rest of the crate talks to.
//! Every call takes the [`Session`] explicitly; implementations map the
//! service's loosely-typed responses into the records in [`crate::model`].
//!
//! The trait is annotated for `mockall` so tests can script the remote side.

pub mod smugmug;

use crate::error::Result;
use crate::model::{Album, AlbumDetails, Extras, ImageInfo, RemoteItem, Session};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

pub use smugmug::SmugMugClient;

/// Operations the photo service offers
#[cfg_attr(test, automock)]
pub trait RemoteApi {
    /// Authenticate and open a session
    fn login(&self, email: &str, password: &str) -> Result<Session>;

    /// All albums of the session's account, in the order the service lists them
    fn list_albums(&self, session: &Session) -> Result<Vec<Album>>;

    /// Create an album; the returned record may lack the URL
    fn create_album(&self, session: &Session, title: &str, public: bool) -> Result<Album>;

    /// Look up attributes not included in listings
    fn album_info(&self, session: &Session, album: &Album) -> Result<AlbumDetails>;

    /// Images of an album in server order, with the requested optional fields
    fn list_images(
        &self,
        session: &Session,
        album: &Album,
        extras: Extras,
    ) -> Result<Vec<RemoteItem>>;

    /// Upload one local file into an album
    ///
    /// `digest` is the file's MD5 as computed by the caller; the service
    /// checks the received body against it.
    fn upload_image(
        &self,
        session: &Session,
        album: &Album,
        path: &Path,
        digest: &str,
        metadata: &Map<String, Value>,
    ) -> Result<()>;

    /// Delete one image
    fn delete_image(&self, session: &Session, image: &RemoteItem) -> Result<()>;

    /// Look up per-image attributes not included in listings
    fn image_info(&self, session: &Session, image_key: &str) -> Result<ImageInfo>;

    /// Open a stream over an image's original content
    fn open_original(&self, session: &Session, url: &str) -> Result<Box<dyn Read>>;
}
