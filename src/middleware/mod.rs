// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, sessions, security headers).

pub mod auth;
pub mod security;

pub use auth::{attach_session, require_admin, require_auth};
