/// A line of the image that does not parse as an instruction byte.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
  #[error("line {line}: invalid instruction literal {text:?}")]
  InvalidLiteral { line: usize, text: String },
}

/// A program image: the byte sequence a machine loads at address 0.
///
/// The textual format is one byte per line written as binary digits; `#`
/// starts a comment and blank lines are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
  bytes: Vec<u8>,
}

impl Program {
  /// Parse a textual image. Line numbers in errors are 1-based.
  pub fn parse(source: &str) -> Result<Self, ParseError> {
    let mut bytes = Vec::new();
    for (index, line) in source.lines().enumerate() {
      let text = line.split('#').next().unwrap_or_default().trim();
      if text.is_empty() {
        continue;
      }
      let byte = u8::from_str_radix(text, 2).map_err(|_| ParseError::InvalidLiteral {
        line: index + 1,
        text: text.to_owned(),
      })?;
      bytes.push(byte);
    }
    Ok(Self { bytes })
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl From<Vec<u8>> for Program {
  fn from(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }
}
