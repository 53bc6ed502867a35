//! Canonicalization dictionaries for places and professions.
//!
//! Each parser accepts an optional caller-supplied definitions list that
//! replaces the built-in template list for that call. Definitions are never
//! mutated.

pub mod dictionary;
pub mod places;
pub mod professions;

pub use places::{
    builtin_places, parse_place, place_definitions_from_json, ParsedPlace, PlaceCategory,
    PlaceDefinition, PlaceMatch,
};
pub use professions::{
    builtin_professions, parse_profession, profession_definitions_from_json, ParsedProfession,
    ProfessionDefinition,
};
