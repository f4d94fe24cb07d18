//! # Scripting Types
//!
//! Handle types for Rhai scripting integration.
//!
//! ## Responsibilities
//! - **SketchHandle**: the `b` argument of `setup`/`draw`, wrapping the session.
//!
//! `ShapeHandle` and `PropertyHandle` are registered directly as `Properties`
//! and `Property`.

use crate::session::Session;
use rhai::EvalAltResult;
use std::sync::{Arc, Mutex, MutexGuard};

/// Wrapper around `Session` for Rhai scripting.
#[derive(Clone)]
pub struct SketchHandle {
    pub session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for SketchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SketchHandle").finish_non_exhaustive()
    }
}

impl SketchHandle {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Session>, Box<EvalAltResult>> {
        self.session
            .lock()
            .map_err(|_| "sketch session lock poisoned".into())
    }
}
