use crate::error::LinkError;
use url::Url;

/// Capability invoked when a link is activated.
///
/// Opening is fire-and-forget: implementations must not block the pointer
/// event that triggered them.
pub trait LinkOpener {
    fn open(&mut self, uri: &Url) -> Result<(), LinkError>;
}

/// Opens links in the desktop's default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&mut self, uri: &Url) -> Result<(), LinkError> {
        webbrowser::open(uri.as_str()).map_err(|err| LinkError::Open {
            target: uri.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Collects activated links instead of opening them
#[derive(Debug, Default, Clone)]
pub struct RecordingOpener {
    pub opened: Vec<Url>,
}

impl LinkOpener for RecordingOpener {
    fn open(&mut self, uri: &Url) -> Result<(), LinkError> {
        self.opened.push(uri.clone());
        Ok(())
    }
}

/// Parse a link target into an absolute URI
pub fn parse_link_target(target: &str) -> Result<Url, LinkError> {
    Url::parse(target.trim()).map_err(|err| LinkError::Malformed {
        target: target.to_string(),
        reason: err.to_string(),
    })
}

/// Activate `target`. Malformed targets and opener failures are logged and
/// swallowed; the return value only reports whether anything was opened.
pub fn activate_link(opener: &mut dyn LinkOpener, target: &str) -> bool {
    let uri = match parse_link_target(target) {
        Ok(uri) => uri,
        Err(err) => {
            log::debug!("Ignoring link: {err}");
            return false;
        }
    };

    match opener.open(&uri) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("{err}");
            false
        }
    }
}
