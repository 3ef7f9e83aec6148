//! Q&A sessions between personas.
//!
//! A session is a finite sequence of exchanges; each exchange is one
//! question from the questioner and one entry per respondent.

pub mod entities;
pub mod parsing;
