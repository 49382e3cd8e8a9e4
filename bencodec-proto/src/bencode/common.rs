use std::{
    borrow::Borrow,
    collections::BTreeMap,
    fmt::{self, Debug, Formatter},
    mem,
};

pub const INT_START: u8 = b'i';
pub const LIST_START: u8 = b'l';
pub const DICT_START: u8 = b'd';
pub const END: u8 = b'e';
pub const STRING_DELIM: u8 = b':';

/// Represents a Bencoded (byte) string.
///
/// Most of the time it holds binary data and not printable text, so no UTF-8 validation is done.
/// Ordering is the lexicographic ordering of the raw bytes, which is the order dictionary keys
/// are kept (and encoded) in.
#[derive(PartialEq, Eq, Clone, PartialOrd, Ord, Hash, Default)]
pub struct ByteString(pub Vec<u8>);

/// The children of a list, in input order.
pub type List<'a> = Vec<Element<'a>>;

/// The entries of a dictionary, always sorted by key.
///
/// Inserting an existing key replaces its value (last write wins).
pub type Dict<'a> = BTreeMap<ByteString, Element<'a>>;

/// The root elements produced by a single decode call, in input order.
pub type Elements<'a> = Vec<Element<'a>>;

/// The variant tag of a [`Value`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ElementKind {
    Null,
    Int,
    String,
    List,
    Dict,
}

/// The typed payload of an [`Element`].
///
/// # Variants
///
/// - `Null`: Marker without payload. It is never produced by the decoder and encodes to nothing.
/// - `Int(i64)`: Represents a Bencoded integer.
/// - `String(ByteString)`: Represents a Bencoded string.
/// - `List(List)`: Represents a Bencoded list.
/// - `Dict(Dict)`: Represents a Bencoded dictionary, keyed by byte strings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Value<'a> {
    Null,
    Int(i64),
    String(ByteString),
    List(List<'a>),
    Dict(Dict<'a>),
}

/// A decoded (or hand-built) bencode element.
///
/// Every element remembers its raw span: the exact bytes of the input that produced it,
/// delimiters included (`i42e` for an integer, `4:spam` for a string, the whole `l...e` for a
/// list). The span borrows the decoded buffer, so an element can never outlive it; call
/// [`Element::into_static`] to detach a tree from its input.
///
/// Elements built by hand have an empty raw span.
///
/// Equality is structural: two elements are equal when their values are, whatever their spans.
///
/// Dropping, cloning, comparing and measuring an element walk the tree with an explicit stack,
/// so nesting depth is bounded by memory only. `Debug` output is the exception and recurses.
pub struct Element<'a> {
    value: Value<'a>,
    raw: &'a [u8],
}

impl<'a> Element<'a> {
    pub fn new(value: Value<'a>) -> Self {
        Element { value, raw: &[] }
    }

    pub(crate) fn with_raw(value: Value<'a>, raw: &'a [u8]) -> Self {
        Element { value, raw }
    }

    pub fn null() -> Self {
        Element::new(Value::Null)
    }

    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Element<'a>>,
    {
        Element::new(Value::List(items.into_iter().collect()))
    }

    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<ByteString>,
        I: IntoIterator<Item = (K, Element<'a>)>,
    {
        Element::new(Value::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        ))
    }

    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn into_value(mut self) -> Value<'a> {
        mem::replace(&mut self.value, Value::Null)
    }

    /// Returns the bytes of the input this element was decoded from.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn kind(&self) -> ElementKind {
        match self.value {
            Value::Null => ElementKind::Null,
            Value::Int(_) => ElementKind::Int,
            Value::String(_) => ElementKind::String,
            Value::List(_) => ElementKind::List,
            Value::Dict(_) => ElementKind::Dict,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind() == ElementKind::Null
    }

    pub fn is_int(&self) -> bool {
        self.kind() == ElementKind::Int
    }

    pub fn is_string(&self) -> bool {
        self.kind() == ElementKind::String
    }

    pub fn is_list(&self) -> bool {
        self.kind() == ElementKind::List
    }

    pub fn is_dict(&self) -> bool {
        self.kind() == ElementKind::Dict
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            Value::Int(int) => Some(int),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            Value::String(string) => Some(&string.0),
            _ => None,
        }
    }

    /// Returns the string payload if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn as_list(&self) -> Option<&List<'a>> {
        match &self.value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict<'a>> {
        match &self.value {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Looks up `key` when this element is a dictionary.
    pub fn get<K>(&self, key: &K) -> Option<&Element<'a>>
    where
        K: AsRef<[u8]> + ?Sized,
    {
        self.as_dict()?.get(key.as_ref())
    }

    pub fn into_byte_string(mut self) -> Result<ByteString, Self> {
        match mem::replace(&mut self.value, Value::Null) {
            Value::String(string) => Ok(string),
            value => {
                self.value = value;
                Err(self)
            }
        }
    }

    pub fn into_list(mut self) -> Result<List<'a>, Self> {
        match mem::replace(&mut self.value, Value::Null) {
            Value::List(list) => Ok(list),
            value => {
                self.value = value;
                Err(self)
            }
        }
    }

    pub fn into_dict(mut self) -> Result<Dict<'a>, Self> {
        match mem::replace(&mut self.value, Value::Null) {
            Value::Dict(dict) => Ok(dict),
            value => {
                self.value = value;
                Err(self)
            }
        }
    }

    /// Detaches this tree from the buffer it was decoded from, dropping every raw span.
    pub fn into_static(self) -> Element<'static> {
        self.rebuild(|_| EMPTY_SPAN)
    }

    /// Returns the number of nested container levels, `0` for scalars.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut pending = vec![(self, 0)];
        while let Some((element, level)) = pending.pop() {
            match &element.value {
                Value::List(list) => {
                    depth = depth.max(level + 1);
                    pending.extend(list.iter().map(|item| (item, level + 1)));
                }
                Value::Dict(dict) => {
                    depth = depth.max(level + 1);
                    pending.extend(dict.values().map(|value| (value, level + 1)));
                }
                _ => {}
            }
        }
        depth
    }

    fn has_children(&self) -> bool {
        match &self.value {
            Value::List(list) => !list.is_empty(),
            Value::Dict(dict) => !dict.is_empty(),
            _ => false,
        }
    }

    /// Copies the tree, taking each copy's raw span from `raw_of`.
    ///
    /// Children are copied before their parent: finished copies wait on `built` until the step
    /// that assembles their container pops them off.
    fn rebuild<'b, F>(&self, raw_of: F) -> Element<'b>
    where
        F: Fn(&Element<'a>) -> &'b [u8],
    {
        enum Step<'e, 'v, 'r> {
            Copy(&'e Element<'v>),
            List(&'r [u8], usize),
            Dict(&'r [u8], Vec<&'e ByteString>),
        }

        let mut steps = vec![Step::Copy(self)];
        let mut built: Vec<Element<'b>> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Copy(element) => {
                    let raw = raw_of(element);
                    match &element.value {
                        Value::Null => built.push(Element::with_raw(Value::Null, raw)),
                        Value::Int(int) => built.push(Element::with_raw(Value::Int(*int), raw)),
                        Value::String(string) => {
                            built.push(Element::with_raw(Value::String(string.clone()), raw))
                        }
                        Value::List(list) => {
                            steps.push(Step::List(raw, list.len()));
                            steps.extend(list.iter().rev().map(Step::Copy));
                        }
                        Value::Dict(dict) => {
                            steps.push(Step::Dict(raw, dict.keys().collect()));
                            steps.extend(dict.values().rev().map(Step::Copy));
                        }
                    }
                }
                Step::List(raw, len) => {
                    let items = built.split_off(built.len() - len);
                    built.push(Element::with_raw(Value::List(items), raw));
                }
                Step::Dict(raw, keys) => {
                    let values = built.split_off(built.len() - keys.len());
                    let entries = keys.into_iter().cloned().zip(values).collect();
                    built.push(Element::with_raw(Value::Dict(entries), raw));
                }
            }
        }
        built.pop().unwrap_or_else(Element::null)
    }
}

const EMPTY_SPAN: &[u8] = &[];

impl Clone for Element<'_> {
    fn clone(&self) -> Self {
        self.rebuild(Element::raw)
    }
}

impl Drop for Element<'_> {
    fn drop(&mut self) {
        if !self.has_children() {
            return;
        }
        // Flatten the tree into a work-list so no child is dropped while still holding its own
        // children.
        let mut pending = vec![mem::replace(&mut self.value, Value::Null)];
        while let Some(value) = pending.pop() {
            match value {
                Value::List(list) => {
                    for mut item in list {
                        if item.has_children() {
                            pending.push(mem::replace(&mut item.value, Value::Null));
                        }
                    }
                }
                Value::Dict(dict) => {
                    for mut value in dict.into_values() {
                        if value.has_children() {
                            pending.push(mem::replace(&mut value.value, Value::Null));
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            match (&left.value, &right.value) {
                (Value::Null, Value::Null) => {}
                (Value::Int(left), Value::Int(right)) if left == right => {}
                (Value::String(left), Value::String(right)) if left == right => {}
                (Value::List(left), Value::List(right)) if left.len() == right.len() => {
                    pending.extend(left.iter().zip(right));
                }
                (Value::Dict(left), Value::Dict(right)) if left.len() == right.len() => {
                    for ((left_key, left), (right_key, right)) in left.iter().zip(right) {
                        if left_key != right_key {
                            return false;
                        }
                        pending.push((left, right));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Element<'_> {}

impl Debug for Element<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.value, f)
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "b\"{}\"", self.0.escape_ascii())
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for ByteString {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<String> for ByteString {
    fn from(input: String) -> Self {
        ByteString(input.into_bytes())
    }
}

impl From<&str> for ByteString {
    fn from(input: &str) -> Self {
        ByteString(input.as_bytes().to_vec())
    }
}

impl From<&[u8]> for ByteString {
    fn from(input: &[u8]) -> Self {
        ByteString(input.to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(input: Vec<u8>) -> Self {
        ByteString(input)
    }
}

impl From<ByteString> for Vec<u8> {
    fn from(input: ByteString) -> Self {
        input.0
    }
}

impl TryFrom<ByteString> for String {
    type Error = std::string::FromUtf8Error;

    fn try_from(input: ByteString) -> Result<Self, Self::Error> {
        String::from_utf8(input.0)
    }
}

impl<'a> From<Value<'a>> for Element<'a> {
    fn from(value: Value<'a>) -> Self {
        Element::new(value)
    }
}

macro_rules! impl_from_integer {
    ($($int:ty),*) => {
        $(
            impl From<$int> for Element<'_> {
                fn from(input: $int) -> Self {
                    Element::new(Value::Int(input.into()))
                }
            }
        )*
    };
}

// Every integer type that widens losslessly into `i64`.
impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<ByteString> for Element<'_> {
    fn from(input: ByteString) -> Self {
        Element::new(Value::String(input))
    }
}

impl From<&str> for Element<'_> {
    fn from(input: &str) -> Self {
        ByteString::from(input).into()
    }
}

impl From<String> for Element<'_> {
    fn from(input: String) -> Self {
        ByteString::from(input).into()
    }
}

impl From<&[u8]> for Element<'_> {
    fn from(input: &[u8]) -> Self {
        ByteString::from(input).into()
    }
}

impl From<Vec<u8>> for Element<'_> {
    fn from(input: Vec<u8>) -> Self {
        ByteString::from(input).into()
    }
}

impl<'a> From<List<'a>> for Element<'a> {
    fn from(input: List<'a>) -> Self {
        Element::new(Value::List(input))
    }
}

impl<'a> From<Dict<'a>> for Element<'a> {
    fn from(input: Dict<'a>) -> Self {
        Element::new(Value::Dict(input))
    }
}
