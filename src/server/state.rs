use crate::overlay::OverlayEngine;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) engine: OverlayEngine,
}
