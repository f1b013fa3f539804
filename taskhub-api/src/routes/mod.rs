/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, profile, and the admin-gated endpoint
/// - `tasks`: Owner-scoped task CRUD and label management

pub mod auth;
pub mod health;
pub mod tasks;
