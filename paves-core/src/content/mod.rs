//! Page content: parsing, interpretation and the resulting objects

pub mod interpreter;
pub mod objects;
pub mod parser;
pub mod state;

pub use interpreter::Interpreter;
pub use objects::{
    ContentObject, GlyphObject, ImageObject, ObjectState, PathObject, PathSegment, TextObject,
    XObjectObject,
};
pub use parser::{ContentOperation, ContentParser, Operand, ParseError, ParseResult, TextElement};
pub use state::{Color, ColorSpace, DashPattern, GraphicState, MarkedContent, TextState};
