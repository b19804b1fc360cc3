//! This module contains the logger's background tasks.

pub(crate) mod extras;
