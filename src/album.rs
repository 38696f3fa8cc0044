//! Album lookup and creation

use crate::config::Privacy;
use crate::error::{Error, Result};
use crate::model::{Album, Session};
use crate::remote::RemoteApi;
use tracing::{debug, info, warn};

/// Resolves album names against the account's albums
pub struct AlbumResolver<'a> {
    remote: &'a dyn RemoteApi,
    session: &'a Session,
}

impl<'a> AlbumResolver<'a> {
    pub fn new(remote: &'a dyn RemoteApi, session: &'a Session) -> Self {
        Self { remote, session }
    }

    /// Find an album by case-insensitive title
    ///
    /// The first match in listing order wins; if the service allows two
    /// albums whose titles differ only in case, which one is returned is up
    /// to the service's ordering.
    pub fn find(&self, name: &str) -> Result<Option<Album>> {
        let wanted = name.to_lowercase();
        let albums = self.remote.list_albums(self.session)?;
        let found = albums
            .into_iter()
            .filter(|album| !album.title.is_empty())
            .find(|album| album.title.to_lowercase() == wanted);
        debug!(name, found = found.is_some(), "Looked up album");
        Ok(found)
    }

    /// Find an album by name, creating it when absent
    pub fn resolve(&self, name: &str, privacy: Privacy) -> Result<Album> {
        if name.is_empty() {
            return Err(Error::Config("Album name must not be empty".into()));
        }
        match self.find(name)? {
            Some(album) => Ok(album),
            None => self.create(name, privacy),
        }
    }

    /// Create an album, reporting its URL
    ///
    /// Only the first character of the name is uppercased. Failure to
    /// create surfaces as [`Error::NotFound`]; failure to look up the URL
    /// afterwards only loses the URL.
    pub fn create(&self, name: &str, privacy: Privacy) -> Result<Album> {
        let title = format_album_name(name);
        let mut album = self
            .remote
            .create_album(self.session, &title, privacy.is_public())
            .map_err(|e| Error::NotFound(format!("{} (creation failed: {})", title, e)))?;

        match self.remote.album_info(self.session, &album) {
            Ok(details) => album.url = details.url.or(album.url),
            Err(e) => warn!(album = %title, error = %e, "Could not fetch album info"),
        }

        info!(
            album = %title,
            privacy = privacy.label(),
            "{} album {} created. URL: {}",
            privacy.label(),
            title,
            album.url.as_deref().unwrap_or("unknown")
        );
        Ok(album)
    }

    /// Titles of all albums, skipping untitled ones
    pub fn list_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .remote
            .list_albums(self.session)?
            .into_iter()
            .map(|album| album.title)
            .filter(|title| !title.is_empty())
            .collect())
    }
}

/// Uppercase the first character, leaving the rest untouched
pub fn format_album_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
