use tracing::{debug, trace};

use super::{
    ByteString, DICT_START, Dict, END, Element, Elements, Error, INT_START, LIST_START, List,
    Reason, STRING_DELIM, Value, is_digit, valid_int_format, valid_str_len_format,
};

/// Maximum number of simultaneously open containers accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Limits and strictness knobs of a [`Decoder`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DecoderConfig {
    /// Maximum number of lists/dictionaries that may be open at the same time.
    pub max_depth: usize,
    /// Reject dictionaries whose keys are not strictly ascending (unsorted or duplicated).
    ///
    /// When off, a duplicated key silently replaces the earlier entry.
    pub strict_key_order: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_key_order: false,
        }
    }
}

/// A single-pass bencode decoder.
///
/// The decoder holds no state between calls: every call to [`Decoder::decode`] owns its own
/// working stack, so one decoder can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

/// A container that has been opened but not closed yet, with the offset of its opening
/// delimiter.
#[derive(Debug)]
enum Frame<'a> {
    List {
        start: usize,
        items: List<'a>,
    },
    Dict {
        start: usize,
        entries: Dict<'a>,
        // Set between a key and its value.
        key: Option<ByteString>,
    },
}

impl Frame<'_> {
    fn start(&self) -> usize {
        match self {
            Frame::List { start, .. } | Frame::Dict { start, .. } => *start,
        }
    }
}

struct State<'a, 'c> {
    input: &'a [u8],
    config: &'c DecoderConfig,
    stack: Vec<Frame<'a>>,
    roots: Elements<'a>,
}

impl<'a> State<'a, '_> {
    fn open(&mut self, frame: Frame<'a>) -> Result<(), Error> {
        if self.stack.len() >= self.config.max_depth {
            return Err(Error::decoding(Reason::DepthExceeded, frame.start()));
        }
        self.stack.push(frame);
        Ok(())
    }

    /// Closes the innermost container on the `e` found at `end`.
    fn close(&mut self, end: usize) -> Result<(), Error> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::decoding(Reason::UnmatchedEnd, end))?;
        let input = self.input;
        let (start, value) = match frame {
            Frame::List { start, items } => (start, Value::List(items)),
            Frame::Dict {
                key: Some(_), ..
            } => return Err(Error::decoding(Reason::MissingValue, end)),
            Frame::Dict {
                start,
                entries,
                key: None,
            } => (start, Value::Dict(entries)),
        };
        self.complete(Element::with_raw(value, &input[start..=end]), start)
    }

    /// Hands a finished element (starting at `start`) to the innermost open container, or to
    /// the roots when nothing is open.
    fn complete(&mut self, element: Element<'a>, start: usize) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => self.roots.push(element),
            Some(Frame::List { items, .. }) => items.push(element),
            Some(Frame::Dict { entries, key, .. }) => match key.take() {
                Some(key) => {
                    entries.insert(key, element);
                }
                None => {
                    let new_key = element
                        .into_byte_string()
                        .map_err(|_| Error::decoding(Reason::KeyType, start))?;
                    if self.config.strict_key_order {
                        if let Some((last_key, _)) = entries.last_key_value() {
                            if *last_key >= new_key {
                                return Err(Error::decoding(Reason::KeyOrder, start));
                            }
                        }
                    }
                    *key = Some(new_key);
                }
            },
        }
        Ok(())
    }
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Decoder { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes every top-level element of `input`.
    ///
    /// The whole buffer must be consumed into balanced, well-formed elements; the first error
    /// aborts the call and no partial result is returned. Each decoded element borrows its raw
    /// span from `input`.
    pub fn decode<'a>(&self, input: &'a [u8]) -> Result<Elements<'a>, Error> {
        trace!(len = input.len(), "decoding bencode input");
        match self.decode_elements(input) {
            Ok(elements) => {
                debug!(roots = elements.len(), len = input.len(), "decoded bencode input");
                Ok(elements)
            }
            Err(error) => {
                debug!(
                    reason = ?error.reason(),
                    offset = error.offset(),
                    "failed to decode bencode input"
                );
                Err(error)
            }
        }
    }

    fn decode_elements<'a>(&self, input: &'a [u8]) -> Result<Elements<'a>, Error> {
        let mut state = State {
            input,
            config: &self.config,
            stack: Vec::new(),
            roots: Vec::new(),
        };

        let mut cursor = 0;
        while cursor < input.len() {
            let start = cursor;
            match input[cursor] {
                INT_START => {
                    let (end, integer) = scan_integer(input, start)?;
                    let element = Element::with_raw(Value::Int(integer), &input[start..end]);
                    state.complete(element, start)?;
                    cursor = end;
                }
                c if is_digit(c) => {
                    let (end, string) = scan_string(input, start)?;
                    let element = Element::with_raw(Value::String(string), &input[start..end]);
                    state.complete(element, start)?;
                    cursor = end;
                }
                LIST_START => {
                    state.open(Frame::List {
                        start,
                        items: Vec::new(),
                    })?;
                    cursor += 1;
                }
                DICT_START => {
                    state.open(Frame::Dict {
                        start,
                        entries: Dict::new(),
                        key: None,
                    })?;
                    cursor += 1;
                }
                END => {
                    state.close(cursor)?;
                    cursor += 1;
                }
                _ => return Err(Error::decoding(Reason::UnexpectedElement, cursor)),
            }
        }

        match state.stack.last() {
            Some(frame) => Err(Error::decoding(Reason::Inconsistent, frame.start())),
            None => Ok(state.roots),
        }
    }
}

/// Decodes every top-level element of `input` with the default [`DecoderConfig`].
///
/// # Examples
///
/// ```rust
/// use bencodec_proto::bencode::{decode, Element};
///
/// let elements = decode(b"4:spami42e").unwrap();
/// assert_eq!(elements, vec![Element::from("spam"), Element::from(42)]);
/// assert_eq!(elements[1].raw(), b"i42e");
/// ```
pub fn decode<T>(input: &T) -> Result<Elements<'_>, Error>
where
    T: AsRef<[u8]> + ?Sized,
{
    Decoder::default().decode(input.as_ref())
}

/// Decodes a single bencoded integer at the start of `input`.
///
/// # Returns
///
/// * `Ok((usize, i64))` - The number of bytes read (delimiters included) and the integer.
/// * `Err(_)` - If `input` does not start with a well-formed integer element.
pub fn decode_integer<T>(input: &T) -> Result<(usize, i64), Error>
where
    T: AsRef<[u8]> + ?Sized,
{
    let input = input.as_ref();
    match input.first() {
        Some(&INT_START) => scan_integer(input, 0),
        _ => Err(Error::decoding(Reason::UnexpectedElement, 0)),
    }
}

/// Decodes a single bencoded string at the start of `input`.
///
/// # Returns
///
/// * `Ok((usize, ByteString))` - The number of bytes read (length prefix included) and the string.
/// * `Err(_)` - If `input` does not start with a well-formed string element.
pub fn decode_string<T>(input: &T) -> Result<(usize, ByteString), Error>
where
    T: AsRef<[u8]> + ?Sized,
{
    let input = input.as_ref();
    match input.first() {
        Some(&c) if is_digit(c) => scan_string(input, 0),
        _ => Err(Error::decoding(Reason::UnexpectedElement, 0)),
    }
}

/// Scans the integer element whose `i` is at `start`, returning one past its closing `e`.
fn scan_integer(input: &[u8], start: usize) -> Result<(usize, i64), Error> {
    let body_start = start + 1;
    let body_end = find(input, body_start, END)
        .ok_or_else(|| Error::decoding(Reason::IntegerUnterminated, start))?;
    let body = &input[body_start..body_end];

    if body.is_empty() {
        return Err(Error::decoding(Reason::IntegerEmpty, start));
    }
    if !valid_int_format(body) {
        return Err(Error::decoding(Reason::IntegerFormat, start));
    }
    let integer = parse_integer(body).ok_or_else(|| Error::decoding(Reason::IntegerOverflow, start))?;

    Ok((body_end + 1, integer))
}

/// Scans the string element whose length prefix begins at `start`, returning one past its last
/// payload byte.
fn scan_string(input: &[u8], start: usize) -> Result<(usize, ByteString), Error> {
    let delim = find(input, start, STRING_DELIM)
        .ok_or_else(|| Error::decoding(Reason::LengthUnterminated, start))?;
    let length = &input[start..delim];

    if !valid_str_len_format(length) {
        return Err(Error::decoding(Reason::LengthFormat, start));
    }
    let length = parse_length(length).ok_or_else(|| Error::decoding(Reason::LengthOverflow, start))?;

    let data_start = delim + 1;
    if input.len() - data_start < length {
        return Err(Error::decoding(Reason::NotEnoughBytes, start));
    }
    let data_end = data_start + length;

    Ok((data_end, input[data_start..data_end].into()))
}

fn find(input: &[u8], from: usize, delim: u8) -> Option<usize> {
    input
        .get(from..)?
        .iter()
        .position(|&c| c == delim)
        .map(|index| from + index)
}

/// Converts a validated integer body, failing on anything that does not fit an `i64`.
///
/// Negative numbers are accumulated downwards so that `i64::MIN` is representable.
fn parse_integer(body: &[u8]) -> Option<i64> {
    let (negative, digits) = match body {
        [b'-', digits @ ..] => (true, digits),
        digits => (false, digits),
    };
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0i64, |value, &c| {
        if !is_digit(c) {
            return None;
        }
        let digit = i64::from(c - b'0');
        let value = value.checked_mul(10)?;
        if negative {
            value.checked_sub(digit)
        } else {
            value.checked_add(digit)
        }
    })
}

fn parse_length(length: &[u8]) -> Option<usize> {
    if length.is_empty() {
        return None;
    }
    length.iter().try_fold(0usize, |value, &c| {
        if !is_digit(c) {
            return None;
        }
        value.checked_mul(10)?.checked_add(usize::from(c - b'0'))
    })
}
