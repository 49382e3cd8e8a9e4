use std::io::{self, Write};

use super::{ByteString, DICT_START, END, Element, INT_START, LIST_START, STRING_DELIM, Value};

/// Write a byte string (as bencode) to the output.
///
/// # Arguments
///
/// * `input` - The bytes to write.
/// * `output` - The output stream to write to.
pub fn write_string<W>(input: &[u8], mut output: W) -> io::Result<()>
where
    W: Write,
{
    write!(output, "{}", input.len())?;
    output.write_all(&[STRING_DELIM])?;
    output.write_all(input)
}

/// Write an integer (as bencode) to the output.
///
/// # Arguments
///
/// * `input` - The integer to write.
/// * `output` - The output stream to write to.
pub fn write_integer<W>(input: i64, mut output: W) -> io::Result<()>
where
    W: Write,
{
    output.write_all(&[INT_START])?;
    write!(output, "{input}")?;
    output.write_all(&[END])
}

enum EncodingToken<'e, 'a> {
    Element(&'e Element<'a>),
    DictKey(&'e ByteString),
    End,
}

/// Writes the encoding of `element` to `output`.
///
/// The tree is walked with an explicit stack, so arbitrarily deep elements do not grow the call
/// stack. Raw spans are ignored: the bytes are rebuilt from the typed values only.
fn encode_into<W>(element: &Element, output: &mut W) -> io::Result<()>
where
    W: Write,
{
    let mut token_stack = vec![EncodingToken::Element(element)];
    while let Some(token) = token_stack.pop() {
        match token {
            EncodingToken::Element(element) => match element.value() {
                // Not a bencode value; contributes nothing.
                Value::Null => {}
                Value::Int(int) => write_integer(*int, &mut *output)?,
                Value::String(string) => write_string(&string.0, &mut *output)?,
                Value::List(list) => {
                    output.write_all(&[LIST_START])?;
                    token_stack.push(EncodingToken::End);
                    token_stack.extend(list.iter().rev().map(EncodingToken::Element));
                }
                Value::Dict(dict) => {
                    output.write_all(&[DICT_START])?;
                    token_stack.push(EncodingToken::End);
                    // The map iterates in ascending key order; push in reverse to pop in order.
                    for (key, value) in dict.iter().rev() {
                        token_stack.push(EncodingToken::Element(value));
                        token_stack.push(EncodingToken::DictKey(key));
                    }
                }
            },
            EncodingToken::DictKey(key) => write_string(&key.0, &mut *output)?,
            EncodingToken::End => output.write_all(&[END])?,
        }
    }
    Ok(())
}

fn encode_to_vec<'e, 'a: 'e, I>(elements: I, capacity: usize) -> Vec<u8>
where
    I: IntoIterator<Item = &'e Element<'a>>,
{
    let mut output = Vec::with_capacity(capacity);
    for element in elements {
        // Writing into a Vec only fails on allocation failure, which aborts instead.
        let _ = encode_into(element, &mut output);
    }
    output
}

/// Encodes a sequence of root elements, concatenated without separator.
///
/// Encoding cannot fail. A `Null` element encodes to zero bytes.
///
/// # Examples
///
/// ```rust
/// use bencodec_proto::bencode::{encode, Element};
///
/// let elements = [Element::dict([("spam", Element::from(42)), ("cow", Element::from("moo"))])];
/// assert_eq!(encode(&elements), b"d3:cow3:moo4:spami42ee");
/// ```
pub fn encode(elements: &[Element]) -> Vec<u8> {
    encode_to_vec(elements, elements.iter().map(encoded_len).sum())
}

/// Encodes a single element.
pub fn encode_element(element: &Element) -> Vec<u8> {
    encode_to_vec([element], encoded_len(element))
}

/// Encodes `elements` into `writer` as the tree is walked.
///
/// Nothing is buffered here: wrap unbuffered sinks such as files or sockets in an
/// [`io::BufWriter`]. The first error from the writer stops the encoding and is returned, leaving
/// whatever was already written in place.
pub fn write_elements<W>(elements: &[Element], mut writer: W) -> io::Result<()>
where
    W: Write,
{
    for element in elements {
        encode_into(element, &mut writer)?;
    }
    Ok(())
}

fn decimal_len(value: u64) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

fn string_len(string: &[u8]) -> usize {
    decimal_len(string.len() as u64) + 1 + string.len()
}

/// Returns the exact number of bytes [`encode_element`] produces for `element`.
pub fn encoded_len(element: &Element) -> usize {
    let mut len = 0;
    let mut stack = vec![element];
    while let Some(element) = stack.pop() {
        len += match element.value() {
            Value::Null => 0,
            Value::Int(int) => {
                let sign = usize::from(*int < 0);
                2 + sign + decimal_len(int.unsigned_abs())
            }
            Value::String(string) => string_len(&string.0),
            Value::List(list) => {
                stack.extend(list.iter());
                2
            }
            Value::Dict(dict) => {
                stack.extend(dict.values());
                2 + dict.keys().map(|key| string_len(&key.0)).sum::<usize>()
            }
        };
    }
    len
}
