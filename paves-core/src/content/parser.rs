//! PDF Content Stream Parser
//!
//! Tokenizes content streams and turns operand/operator sequences into
//! [`ContentOperation`]s. Inline images (`BI ... ID ... EI`) are read
//! directly from the byte stream since their data is not tokenizable.

use crate::geometry::Matrix;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result type for content stream parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Content stream errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Operator {operator}: {message}")]
    BadOperands { operator: String, message: String },
}

/// An operand in a content stream
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    Bool(bool),
    Null,
    Name(String),
    String(Vec<u8>),
    Array(Vec<Operand>),
    Dict(BTreeMap<String, Operand>),
}

impl Operand {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Operand>> {
        match self {
            Operand::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

/// Represents a single operator in a PDF content stream
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    // Text object operators
    BeginText, // BT
    EndText,   // ET

    // Text state operators
    SetCharSpacing(f64),       // Tc
    SetWordSpacing(f64),       // Tw
    SetHorizontalScaling(f64), // Tz
    SetLeading(f64),           // TL
    SetFont(String, f64),      // Tf
    SetTextRenderMode(i64),    // Tr
    SetTextRise(f64),          // Ts

    // Text positioning operators
    MoveText(f64, f64),           // Td
    MoveTextSetLeading(f64, f64), // TD
    SetTextMatrix(Matrix),        // Tm
    NextLine,                     // T*

    // Text showing operators
    ShowText(Vec<u8>),                             // Tj
    ShowTextArray(Vec<TextElement>),               // TJ
    NextLineShowText(Vec<u8>),                     // '
    SetSpacingNextLineShowText(f64, f64, Vec<u8>), // "

    // Graphics state operators
    SaveGraphicsState,               // q
    RestoreGraphicsState,            // Q
    SetTransformMatrix(Matrix),      // cm
    SetLineWidth(f64),               // w
    SetLineCap(i64),                 // J
    SetLineJoin(i64),                // j
    SetMiterLimit(f64),              // M
    SetDashPattern(Vec<f64>, f64),   // d
    SetIntent(String),               // ri
    SetFlatness(f64),                // i
    SetGraphicsStateParams(String),  // gs

    // Path construction operators
    MoveTo(f64, f64),                      // m
    LineTo(f64, f64),                      // l
    CurveTo(f64, f64, f64, f64, f64, f64), // c
    CurveToV(f64, f64, f64, f64),          // v
    CurveToY(f64, f64, f64, f64),          // y
    ClosePath,                             // h
    Rectangle(f64, f64, f64, f64),         // re

    // Path painting operators
    Stroke,                 // S
    CloseStroke,            // s
    Fill,                   // f or F
    FillEvenOdd,            // f*
    FillStroke,             // B
    FillStrokeEvenOdd,      // B*
    CloseFillStroke,        // b
    CloseFillStrokeEvenOdd, // b*
    EndPath,                // n

    // Clipping path operators
    Clip,        // W
    ClipEvenOdd, // W*

    // Color operators
    SetStrokingColorSpace(String),                  // CS
    SetNonStrokingColorSpace(String),               // cs
    SetStrokingColor(Vec<f64>, Option<String>),     // SC, SCN
    SetNonStrokingColor(Vec<f64>, Option<String>),  // sc, scn
    SetStrokingGray(f64),                           // G
    SetNonStrokingGray(f64),                        // g
    SetStrokingRGB(f64, f64, f64),                  // RG
    SetNonStrokingRGB(f64, f64, f64),               // rg
    SetStrokingCMYK(f64, f64, f64, f64),            // K
    SetNonStrokingCMYK(f64, f64, f64, f64),         // k

    // Shading operators
    ShadingFill(String), // sh

    // Inline images (BI ... ID ... EI)
    InlineImage {
        dict: BTreeMap<String, Operand>,
        data: Vec<u8>,
    },

    // XObject operators
    PaintXObject(String), // Do

    // Marked content operators
    BeginMarkedContent(String),                    // BMC
    BeginMarkedContentWithProps(String, Operand),  // BDC
    EndMarkedContent,                              // EMC
    DefineMarkedContentPoint(String),              // MP
    DefineMarkedContentPointWithProps(String, Operand), // DP

    // Compatibility operators
    BeginCompatibility, // BX
    EndCompatibility,   // EX

    // Type 3 glyph metrics (d0, d1)
    SetGlyphWidth(f64, f64),

    /// Anything else, kept so callers can log it
    Unknown(String),
}

/// Represents a text element in a TJ array
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    Text(Vec<u8>),
    Spacing(f64),
}

/// Token types in content streams
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Keyword(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

/// Content stream tokenizer
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    position: usize,
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'\0')
}

fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

impl<'a> ContentTokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the next token from the stream
    pub(crate) fn next_token(&mut self) -> ParseResult<Option<Token>> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(None);
        }

        let ch = self.input[self.position];

        match ch {
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.peek_next() == Some(b'<') {
                    self.position += 2;
                    Ok(Some(Token::DictStart))
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'>') {
                    self.position += 2;
                    Ok(Some(Token::DictEnd))
                } else {
                    Err(ParseError::SyntaxError {
                        position: self.position,
                        message: "Unexpected '>'".to_string(),
                    })
                }
            }
            b'[' => {
                self.position += 1;
                Ok(Some(Token::ArrayStart))
            }
            b']' => {
                self.position += 1;
                Ok(Some(Token::ArrayEnd))
            }
            b'{' | b'}' | b')' => {
                // PostScript calculator braces and stray parens are meaningless here
                self.position += 1;
                self.next_token()
            }
            b'/' => self.read_name(),
            _ => self.read_keyword(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() {
            match self.input[self.position] {
                ch if is_whitespace(ch) => self.position += 1,
                b'%' => self.skip_comment(),
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while self.position < self.input.len()
            && self.input[self.position] != b'\n'
            && self.input[self.position] != b'\r'
        {
            self.position += 1;
        }
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn read_number(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;
        let mut has_dot = false;

        if matches!(self.input[self.position], b'+' | b'-') {
            self.position += 1;
        }
        // Some producers write things like "--1" or "0.-5", eat extra signs
        while self.position < self.input.len() && self.input[self.position] == b'-' {
            self.position += 1;
        }

        while self.position < self.input.len() {
            match self.input[self.position] {
                b'0'..=b'9' => self.position += 1,
                b'.' if !has_dot => {
                    has_dot = true;
                    self.position += 1;
                }
                _ => break,
            }
        }

        let text = String::from_utf8_lossy(&self.input[start..self.position]);
        let negative = text.starts_with('-');
        let digits: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if digits.is_empty() || digits == "." {
            // A lone sign or dot is treated as zero
            return Ok(Some(Token::Integer(0)));
        }

        if has_dot {
            let value = digits
                .parse::<f64>()
                .map_err(|_| ParseError::SyntaxError {
                    position: start,
                    message: format!("Invalid real number {text}"),
                })?;
            Ok(Some(Token::Real(if negative { -value } else { value })))
        } else {
            match digits.parse::<i64>() {
                Ok(value) => Ok(Some(Token::Integer(if negative { -value } else { value }))),
                // Out of range integers become reals
                Err(_) => {
                    let value = digits.parse::<f64>().unwrap_or(0.0);
                    Ok(Some(Token::Real(if negative { -value } else { value })))
                }
            }
        }
    }

    fn read_literal_string(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip opening '('
        let mut result = Vec::new();
        let mut paren_depth = 1;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;

            match ch {
                b'\\' => {
                    let Some(&next) = self.input.get(self.position) else {
                        break;
                    };
                    self.position += 1;
                    match next {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(b'\x08'),
                        b'f' => result.push(b'\x0C'),
                        b'0'..=b'7' => {
                            self.position -= 1;
                            result.push(self.read_octal_escape());
                        }
                        // Line continuation
                        b'\r' => {
                            if self.input.get(self.position) == Some(&b'\n') {
                                self.position += 1;
                            }
                        }
                        b'\n' => {}
                        other => result.push(other),
                    }
                }
                b'(' => {
                    paren_depth += 1;
                    result.push(ch);
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        return Ok(Some(Token::String(result)));
                    }
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        // Unterminated strings are accepted as-is
        Ok(Some(Token::String(result)))
    }

    fn read_octal_escape(&mut self) -> u8 {
        let mut value = 0u32;
        let mut count = 0;

        while count < 3 && self.position < self.input.len() {
            match self.input[self.position] {
                digit @ b'0'..=b'7' => {
                    value = value * 8 + (digit - b'0') as u32;
                    self.position += 1;
                    count += 1;
                }
                _ => break,
            }
        }

        (value & 0xFF) as u8
    }

    fn read_hex_string(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip opening '<'
        let mut result = Vec::new();
        let mut nibble: Option<u8> = None;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;

            let digit = match ch {
                b'>' => {
                    if let Some(n) = nibble {
                        result.push(n << 4);
                    }
                    return Ok(Some(Token::String(result)));
                }
                b'0'..=b'9' => ch - b'0',
                b'A'..=b'F' => ch - b'A' + 10,
                b'a'..=b'f' => ch - b'a' + 10,
                ch if is_whitespace(ch) => continue,
                _ => {
                    return Err(ParseError::SyntaxError {
                        position: self.position - 1,
                        message: format!("Invalid character in hex string: {:?}", ch as char),
                    });
                }
            };

            match nibble.take() {
                Some(n) => result.push((n << 4) | digit),
                None => nibble = Some(digit),
            }
        }

        Err(ParseError::SyntaxError {
            position: self.position,
            message: "Unterminated hex string".to_string(),
        })
    }

    fn read_name(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip '/'
        let mut result = Vec::new();

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            if ch == b'#' && self.position + 2 < self.input.len() + 0 {
                let hex = &self.input[self.position + 1..(self.position + 3).min(self.input.len())];
                if let Some(value) = std::str::from_utf8(hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                {
                    result.push(value);
                    self.position += 3;
                    continue;
                }
            }
            result.push(ch);
            self.position += 1;
        }

        Ok(Some(Token::Name(String::from_utf8_lossy(&result).into_owned())))
    }

    fn read_keyword(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }

        let op = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        Ok(Some(Token::Keyword(op)))
    }

    /// Read raw inline image data following the `ID` operator.
    ///
    /// The data ends at the first `EI` that is preceded by whitespace
    /// and followed by whitespace or end of input.
    fn read_inline_image_data(&mut self) -> Vec<u8> {
        // Exactly one whitespace byte separates ID from the data
        if self.position < self.input.len() && is_whitespace(self.input[self.position]) {
            self.position += 1;
        }
        let start = self.position;
        let mut i = start;
        while i + 1 < self.input.len() {
            if self.input[i] == b'E'
                && self.input[i + 1] == b'I'
                && i > start
                && is_whitespace(self.input[i - 1])
                && self
                    .input
                    .get(i + 2)
                    .map_or(true, |&c| is_whitespace(c) || is_delimiter(c))
            {
                let data = self.input[start..i - 1].to_vec();
                self.position = i + 2;
                return data;
            }
            i += 1;
        }
        self.position = self.input.len();
        self.input[start..].to_vec()
    }
}

/// Content stream parser
pub struct ContentParser<'a> {
    tokenizer: ContentTokenizer<'a>,
}

impl<'a> ContentParser<'a> {
    /// Create a new content parser
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            tokenizer: ContentTokenizer::new(content),
        }
    }

    /// Parse a whole content stream, failing on the first syntax error
    pub fn parse(content: &[u8]) -> ParseResult<Vec<ContentOperation>> {
        let mut parser = ContentParser::new(content);
        let mut operations = Vec::new();
        while let Some(op) = parser.next_operation()? {
            operations.push(op);
        }
        Ok(operations)
    }

    /// Parse a content stream, keeping everything before a syntax error
    pub fn parse_lenient(content: &[u8]) -> Vec<ContentOperation> {
        let mut parser = ContentParser::new(content);
        let mut operations = Vec::new();
        loop {
            match parser.next_operation() {
                Ok(Some(op)) => operations.push(op),
                Ok(None) => break,
                Err(e) => {
                    warn!("Truncating content stream: {e}");
                    break;
                }
            }
        }
        operations
    }

    /// Read the next well-formed operation.
    ///
    /// Operators with missing or mistyped operands are skipped with a
    /// warning rather than failing the whole stream.
    pub fn next_operation(&mut self) -> ParseResult<Option<ContentOperation>> {
        let mut operands: Vec<Operand> = Vec::new();
        loop {
            let Some(token) = self.tokenizer.next_token()? else {
                if !operands.is_empty() {
                    debug!("Discarding {} trailing operands", operands.len());
                }
                return Ok(None);
            };
            match token {
                Token::Keyword(keyword) => match keyword.as_str() {
                    "true" => operands.push(Operand::Bool(true)),
                    "false" => operands.push(Operand::Bool(false)),
                    "null" => operands.push(Operand::Null),
                    "BI" => return self.parse_inline_image().map(Some),
                    _ => match parse_operator(&keyword, &mut operands) {
                        Ok(op) => return Ok(Some(op)),
                        Err(e) => {
                            warn!("Skipping operator: {e}");
                            operands.clear();
                        }
                    },
                },
                other => {
                    let operand = self.build_operand(other)?;
                    operands.push(operand);
                }
            }
        }
    }

    fn build_operand(&mut self, token: Token) -> ParseResult<Operand> {
        match token {
            Token::Integer(i) => Ok(Operand::Integer(i)),
            Token::Real(r) => Ok(Operand::Real(r)),
            Token::String(s) => Ok(Operand::String(s)),
            Token::Name(n) => Ok(Operand::Name(n)),
            Token::ArrayStart => {
                let mut items = Vec::new();
                loop {
                    match self.tokenizer.next_token()? {
                        None | Some(Token::ArrayEnd) => break,
                        Some(Token::Keyword(k)) => items.push(keyword_operand(&k)),
                        Some(t) => items.push(self.build_operand(t)?),
                    }
                }
                Ok(Operand::Array(items))
            }
            Token::DictStart => {
                let mut dict = BTreeMap::new();
                loop {
                    match self.tokenizer.next_token()? {
                        None | Some(Token::DictEnd) => break,
                        Some(Token::Name(key)) => {
                            let value = match self.tokenizer.next_token()? {
                                None | Some(Token::DictEnd) => {
                                    dict.insert(key, Operand::Null);
                                    break;
                                }
                                Some(Token::Keyword(k)) => keyword_operand(&k),
                                Some(t) => self.build_operand(t)?,
                            };
                            dict.insert(key, value);
                        }
                        Some(_) => {
                            return Err(ParseError::SyntaxError {
                                position: self.tokenizer.position(),
                                message: "Dictionary key is not a name".to_string(),
                            });
                        }
                    }
                }
                Ok(Operand::Dict(dict))
            }
            Token::ArrayEnd | Token::DictEnd => Err(ParseError::SyntaxError {
                position: self.tokenizer.position(),
                message: "Unbalanced array or dictionary".to_string(),
            }),
            Token::Keyword(k) => Ok(keyword_operand(&k)),
        }
    }

    fn parse_inline_image(&mut self) -> ParseResult<ContentOperation> {
        let mut dict = BTreeMap::new();
        loop {
            match self.tokenizer.next_token()? {
                None => break,
                Some(Token::Keyword(k)) if k == "ID" => {
                    let data = self.tokenizer.read_inline_image_data();
                    return Ok(ContentOperation::InlineImage { dict, data });
                }
                Some(Token::Name(key)) => {
                    let value = match self.tokenizer.next_token()? {
                        None => Operand::Null,
                        Some(Token::Keyword(k)) if k == "ID" => {
                            dict.insert(key, Operand::Null);
                            let data = self.tokenizer.read_inline_image_data();
                            return Ok(ContentOperation::InlineImage { dict, data });
                        }
                        Some(Token::Keyword(k)) => keyword_operand(&k),
                        Some(t) => self.build_operand(t)?,
                    };
                    dict.insert(key, value);
                }
                Some(_) => {}
            }
        }
        Err(ParseError::SyntaxError {
            position: self.tokenizer.position(),
            message: "Inline image without data".to_string(),
        })
    }
}

fn keyword_operand(keyword: &str) -> Operand {
    match keyword {
        "true" => Operand::Bool(true),
        "false" => Operand::Bool(false),
        _ => Operand::Null,
    }
}

fn bad_operands(op: &str, message: &str) -> ParseError {
    ParseError::BadOperands {
        operator: op.to_string(),
        message: message.to_string(),
    }
}

fn pop_number(op: &str, operands: &mut Vec<Operand>) -> ParseResult<f64> {
    match operands.pop() {
        Some(operand) => operand
            .as_number()
            .ok_or_else(|| bad_operands(op, "expected number")),
        None => Err(bad_operands(op, "missing operand")),
    }
}

fn pop_integer(op: &str, operands: &mut Vec<Operand>) -> ParseResult<i64> {
    pop_number(op, operands).map(|n| n as i64)
}

fn pop_name(op: &str, operands: &mut Vec<Operand>) -> ParseResult<String> {
    match operands.pop() {
        Some(Operand::Name(name)) => Ok(name),
        Some(_) => Err(bad_operands(op, "expected name")),
        None => Err(bad_operands(op, "missing operand")),
    }
}

fn pop_string(op: &str, operands: &mut Vec<Operand>) -> ParseResult<Vec<u8>> {
    match operands.pop() {
        Some(Operand::String(s)) => Ok(s),
        Some(_) => Err(bad_operands(op, "expected string")),
        None => Err(bad_operands(op, "missing operand")),
    }
}

fn pop_array(op: &str, operands: &mut Vec<Operand>) -> ParseResult<Vec<Operand>> {
    match operands.pop() {
        Some(Operand::Array(items)) => Ok(items),
        Some(_) => Err(bad_operands(op, "expected array")),
        None => Err(bad_operands(op, "missing operand")),
    }
}

fn pop_matrix(op: &str, operands: &mut Vec<Operand>) -> ParseResult<Matrix> {
    let f = pop_number(op, operands)?;
    let e = pop_number(op, operands)?;
    let d = pop_number(op, operands)?;
    let c = pop_number(op, operands)?;
    let b = pop_number(op, operands)?;
    let a = pop_number(op, operands)?;
    Ok(Matrix::new(a, b, c, d, e, f))
}

/// Color operands: numbers, optionally followed by a pattern name
fn pop_color(operands: &mut Vec<Operand>) -> (Vec<f64>, Option<String>) {
    let pattern = match operands.last() {
        Some(Operand::Name(_)) => operands.pop().and_then(|o| o.as_name().map(String::from)),
        _ => None,
    };
    let components = operands.iter().filter_map(Operand::as_number).collect();
    operands.clear();
    (components, pattern)
}

fn parse_operator(op: &str, operands: &mut Vec<Operand>) -> ParseResult<ContentOperation> {
    let operation = match op {
        // Text object operators
        "BT" => ContentOperation::BeginText,
        "ET" => ContentOperation::EndText,

        // Text state operators
        "Tc" => ContentOperation::SetCharSpacing(pop_number(op, operands)?),
        "Tw" => ContentOperation::SetWordSpacing(pop_number(op, operands)?),
        "Tz" => ContentOperation::SetHorizontalScaling(pop_number(op, operands)?),
        "TL" => ContentOperation::SetLeading(pop_number(op, operands)?),
        "Tf" => {
            let size = pop_number(op, operands)?;
            let font = pop_name(op, operands)?;
            ContentOperation::SetFont(font, size)
        }
        "Tr" => ContentOperation::SetTextRenderMode(pop_integer(op, operands)?),
        "Ts" => ContentOperation::SetTextRise(pop_number(op, operands)?),

        // Text positioning operators
        "Td" => {
            let ty = pop_number(op, operands)?;
            let tx = pop_number(op, operands)?;
            ContentOperation::MoveText(tx, ty)
        }
        "TD" => {
            let ty = pop_number(op, operands)?;
            let tx = pop_number(op, operands)?;
            ContentOperation::MoveTextSetLeading(tx, ty)
        }
        "Tm" => ContentOperation::SetTextMatrix(pop_matrix(op, operands)?),
        "T*" => ContentOperation::NextLine,

        // Text showing operators
        "Tj" => ContentOperation::ShowText(pop_string(op, operands)?),
        "TJ" => {
            let array = pop_array(op, operands)?;
            let elements = array
                .into_iter()
                .filter_map(|item| match item {
                    Operand::String(s) => Some(TextElement::Text(s)),
                    other => other.as_number().map(TextElement::Spacing),
                })
                .collect();
            ContentOperation::ShowTextArray(elements)
        }
        "'" => ContentOperation::NextLineShowText(pop_string(op, operands)?),
        "\"" => {
            let text = pop_string(op, operands)?;
            let ac = pop_number(op, operands)?;
            let aw = pop_number(op, operands)?;
            ContentOperation::SetSpacingNextLineShowText(aw, ac, text)
        }

        // Graphics state operators
        "q" => ContentOperation::SaveGraphicsState,
        "Q" => ContentOperation::RestoreGraphicsState,
        "cm" => ContentOperation::SetTransformMatrix(pop_matrix(op, operands)?),
        "w" => ContentOperation::SetLineWidth(pop_number(op, operands)?),
        "J" => ContentOperation::SetLineCap(pop_integer(op, operands)?),
        "j" => ContentOperation::SetLineJoin(pop_integer(op, operands)?),
        "M" => ContentOperation::SetMiterLimit(pop_number(op, operands)?),
        "d" => {
            let phase = pop_number(op, operands)?;
            let array = pop_array(op, operands)?;
            let pattern = array.iter().filter_map(Operand::as_number).collect();
            ContentOperation::SetDashPattern(pattern, phase)
        }
        "ri" => ContentOperation::SetIntent(pop_name(op, operands)?),
        "i" => ContentOperation::SetFlatness(pop_number(op, operands)?),
        "gs" => ContentOperation::SetGraphicsStateParams(pop_name(op, operands)?),

        // Path construction operators
        "m" => {
            let y = pop_number(op, operands)?;
            let x = pop_number(op, operands)?;
            ContentOperation::MoveTo(x, y)
        }
        "l" => {
            let y = pop_number(op, operands)?;
            let x = pop_number(op, operands)?;
            ContentOperation::LineTo(x, y)
        }
        "c" => {
            let y3 = pop_number(op, operands)?;
            let x3 = pop_number(op, operands)?;
            let y2 = pop_number(op, operands)?;
            let x2 = pop_number(op, operands)?;
            let y1 = pop_number(op, operands)?;
            let x1 = pop_number(op, operands)?;
            ContentOperation::CurveTo(x1, y1, x2, y2, x3, y3)
        }
        "v" => {
            let y3 = pop_number(op, operands)?;
            let x3 = pop_number(op, operands)?;
            let y2 = pop_number(op, operands)?;
            let x2 = pop_number(op, operands)?;
            ContentOperation::CurveToV(x2, y2, x3, y3)
        }
        "y" => {
            let y3 = pop_number(op, operands)?;
            let x3 = pop_number(op, operands)?;
            let y1 = pop_number(op, operands)?;
            let x1 = pop_number(op, operands)?;
            ContentOperation::CurveToY(x1, y1, x3, y3)
        }
        "h" => ContentOperation::ClosePath,
        "re" => {
            let height = pop_number(op, operands)?;
            let width = pop_number(op, operands)?;
            let y = pop_number(op, operands)?;
            let x = pop_number(op, operands)?;
            ContentOperation::Rectangle(x, y, width, height)
        }

        // Path painting operators
        "S" => ContentOperation::Stroke,
        "s" => ContentOperation::CloseStroke,
        "f" | "F" => ContentOperation::Fill,
        "f*" => ContentOperation::FillEvenOdd,
        "B" => ContentOperation::FillStroke,
        "B*" => ContentOperation::FillStrokeEvenOdd,
        "b" => ContentOperation::CloseFillStroke,
        "b*" => ContentOperation::CloseFillStrokeEvenOdd,
        "n" => ContentOperation::EndPath,

        // Clipping path operators
        "W" => ContentOperation::Clip,
        "W*" => ContentOperation::ClipEvenOdd,

        // Color operators
        "CS" => ContentOperation::SetStrokingColorSpace(pop_name(op, operands)?),
        "cs" => ContentOperation::SetNonStrokingColorSpace(pop_name(op, operands)?),
        "SC" | "SCN" => {
            let (components, pattern) = pop_color(operands);
            ContentOperation::SetStrokingColor(components, pattern)
        }
        "sc" | "scn" => {
            let (components, pattern) = pop_color(operands);
            ContentOperation::SetNonStrokingColor(components, pattern)
        }
        "G" => ContentOperation::SetStrokingGray(pop_number(op, operands)?),
        "g" => ContentOperation::SetNonStrokingGray(pop_number(op, operands)?),
        "RG" => {
            let b = pop_number(op, operands)?;
            let g = pop_number(op, operands)?;
            let r = pop_number(op, operands)?;
            ContentOperation::SetStrokingRGB(r, g, b)
        }
        "rg" => {
            let b = pop_number(op, operands)?;
            let g = pop_number(op, operands)?;
            let r = pop_number(op, operands)?;
            ContentOperation::SetNonStrokingRGB(r, g, b)
        }
        "K" => {
            let k = pop_number(op, operands)?;
            let y = pop_number(op, operands)?;
            let m = pop_number(op, operands)?;
            let c = pop_number(op, operands)?;
            ContentOperation::SetStrokingCMYK(c, m, y, k)
        }
        "k" => {
            let k = pop_number(op, operands)?;
            let y = pop_number(op, operands)?;
            let m = pop_number(op, operands)?;
            let c = pop_number(op, operands)?;
            ContentOperation::SetNonStrokingCMYK(c, m, y, k)
        }

        // Shading operators
        "sh" => ContentOperation::ShadingFill(pop_name(op, operands)?),

        // XObject operators
        "Do" => ContentOperation::PaintXObject(pop_name(op, operands)?),

        // Marked content operators
        "BMC" => ContentOperation::BeginMarkedContent(pop_name(op, operands)?),
        "BDC" => {
            let props = operands
                .pop()
                .ok_or_else(|| bad_operands(op, "missing properties"))?;
            let tag = pop_name(op, operands)?;
            ContentOperation::BeginMarkedContentWithProps(tag, props)
        }
        "EMC" => ContentOperation::EndMarkedContent,
        "MP" => ContentOperation::DefineMarkedContentPoint(pop_name(op, operands)?),
        "DP" => {
            let props = operands
                .pop()
                .ok_or_else(|| bad_operands(op, "missing properties"))?;
            let tag = pop_name(op, operands)?;
            ContentOperation::DefineMarkedContentPointWithProps(tag, props)
        }

        // Compatibility operators
        "BX" => ContentOperation::BeginCompatibility,
        "EX" => ContentOperation::EndCompatibility,

        "d0" => {
            let wy = pop_number(op, operands)?;
            let wx = pop_number(op, operands)?;
            ContentOperation::SetGlyphWidth(wx, wy)
        }
        "d1" => {
            // llx lly urx ury are ignored
            for _ in 0..4 {
                pop_number(op, operands)?;
            }
            let wy = pop_number(op, operands)?;
            let wx = pop_number(op, operands)?;
            ContentOperation::SetGlyphWidth(wx, wy)
        }

        other => ContentOperation::Unknown(other.to_string()),
    };
    operands.clear();
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_numbers() {
        let mut tokenizer = ContentTokenizer::new(b"12 -3.5 .5 +7 -.25");
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Integer(12)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Real(-3.5)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Real(0.5)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Integer(7)));
        assert_eq!(tokenizer.next_token().unwrap(), Some(Token::Real(-0.25)));
        assert_eq!(tokenizer.next_token().unwrap(), None);
    }

    #[test]
    fn test_tokenize_strings() {
        let mut tokenizer = ContentTokenizer::new(b"(Hello (nested) \\(world\\)\\n\\101) <48 65 6c6C6f> <7>");
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"Hello (nested) (world)\nA".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(b"Hello".to_vec()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::String(vec![0x70]))
        );
    }

    #[test]
    fn test_tokenize_names_and_comments() {
        let mut tokenizer = ContentTokenizer::new(b"/F1 % a comment\n/A#20B Tf");
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("F1".to_string()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Name("A B".to_string()))
        );
        assert_eq!(
            tokenizer.next_token().unwrap(),
            Some(Token::Keyword("Tf".to_string()))
        );
    }

    #[test]
    fn test_invalid_hex_string() {
        let mut tokenizer = ContentTokenizer::new(b"<48zz>");
        assert!(tokenizer.next_token().is_err());
    }

    #[test]
    fn test_parse_text_operations() {
        let content = b"BT /F1 12 Tf 100 700 Td (Hello) Tj [(A) -120 (B)] TJ ET";
        let ops = ContentParser::parse(content).unwrap();
        assert_eq!(
            ops,
            vec![
                ContentOperation::BeginText,
                ContentOperation::SetFont("F1".to_string(), 12.0),
                ContentOperation::MoveText(100.0, 700.0),
                ContentOperation::ShowText(b"Hello".to_vec()),
                ContentOperation::ShowTextArray(vec![
                    TextElement::Text(b"A".to_vec()),
                    TextElement::Spacing(-120.0),
                    TextElement::Text(b"B".to_vec()),
                ]),
                ContentOperation::EndText,
            ]
        );
    }

    #[test]
    fn test_parse_path_operations() {
        let ops = ContentParser::parse(b"q 1 0 0 1 10 20 cm 0 0 50 25 re S Q").unwrap();
        assert_eq!(
            ops,
            vec![
                ContentOperation::SaveGraphicsState,
                ContentOperation::SetTransformMatrix(Matrix::new(1.0, 0.0, 0.0, 1.0, 10.0, 20.0)),
                ContentOperation::Rectangle(0.0, 0.0, 50.0, 25.0),
                ContentOperation::Stroke,
                ContentOperation::RestoreGraphicsState,
            ]
        );
    }

    #[test]
    fn test_marked_content_with_inline_dict() {
        let ops = ContentParser::parse(b"/P <</MCID 3>> BDC EMC /Span /MC0 BDC EMC").unwrap();
        match &ops[0] {
            ContentOperation::BeginMarkedContentWithProps(tag, props) => {
                assert_eq!(tag, "P");
                let dict = props.as_dict().unwrap();
                assert_eq!(dict.get("MCID"), Some(&Operand::Integer(3)));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ops[1], ContentOperation::EndMarkedContent);
        assert_eq!(
            ops[2],
            ContentOperation::BeginMarkedContentWithProps(
                "Span".to_string(),
                Operand::Name("MC0".to_string())
            )
        );
    }

    #[test]
    fn test_inline_image() {
        let content = b"q BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff EI Q";
        let ops = ContentParser::parse(content).unwrap();
        assert_eq!(ops.len(), 3);
        match &ops[1] {
            ContentOperation::InlineImage { dict, data } => {
                assert_eq!(dict.get("W"), Some(&Operand::Integer(2)));
                assert_eq!(dict.get("CS"), Some(&Operand::Name("G".to_string())));
                assert_eq!(data, &vec![0x00, 0xff]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ops[2], ContentOperation::RestoreGraphicsState);
    }

    #[test]
    fn test_bad_operands_are_skipped() {
        // "Tf" with a missing font name is dropped, the rest survives
        let ops = ContentParser::parse(b"12 Tf 1 w").unwrap();
        assert_eq!(ops, vec![ContentOperation::SetLineWidth(1.0)]);
    }

    #[test]
    fn test_color_with_pattern() {
        let ops = ContentParser::parse(b"0.5 /P0 scn 1 0 0 SC").unwrap();
        assert_eq!(
            ops[0],
            ContentOperation::SetNonStrokingColor(vec![0.5], Some("P0".to_string()))
        );
        assert_eq!(
            ops[1],
            ContentOperation::SetStrokingColor(vec![1.0, 0.0, 0.0], None)
        );
    }

    #[test]
    fn test_lenient_parsing_keeps_prefix() {
        let ops = ContentParser::parse_lenient(b"1 w <zz> Tj 2 w");
        assert_eq!(ops, vec![ContentOperation::SetLineWidth(1.0)]);
        assert!(ContentParser::parse(b"1 w <zz> Tj").is_err());
    }

    #[test]
    fn test_unknown_operator() {
        let ops = ContentParser::parse(b"1 2 foo").unwrap();
        assert_eq!(ops, vec![ContentOperation::Unknown("foo".to_string())]);
    }
}
