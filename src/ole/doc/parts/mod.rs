/// Internal parts for parsing DOC file structures.
///
/// This module contains parsers for the binary structures used in
/// legacy Word documents, including:
/// - FIB (File Information Block)
/// - Piece table and text decoding
/// - Paragraph boundaries from PAPX pages
/// - Character properties and style names
pub mod chp;
pub mod chp_bin_table;
pub mod fib;
pub mod fields;
pub mod fkp;
pub mod paragraph_boundary;
pub mod piece_table;
pub mod stylesheet;
pub mod text;
