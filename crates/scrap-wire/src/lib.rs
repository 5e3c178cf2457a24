//! Binary serialization of expression trees.
//!
//! The format is a self-delimiting tagged byte stream. Every tag is one
//! byte; setting the high bit marks a value that is entered into the
//! reference table as it is written, so later occurrences of the same
//! node emit a `TYPE_REF` back-reference instead of re-serializing.
//! Lists and closures are the ref-introducing containers because they are
//! the only nodes that can participate in cycles; the deserializer
//! registers them *before* reading their children so back-references
//! into a partially-built container resolve.
//!
//! Integers that fit in 64 bits use a zig-zag varint ("short"); larger
//! integers use a "long" form: a varint digit count followed by base-2^64
//! digits, least significant first, each little-endian. Strings are a
//! varint length followed by UTF-8 bytes; floats are 8 little-endian
//! bytes.

use std::fmt;
use std::rc::Rc;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

use scrap_parser::ast::{BinopKind, Env, Expr, ExprRef, MatchCase};

pub const TYPE_SHORT: u8 = b'i';
pub const TYPE_LONG: u8 = b'l';
pub const TYPE_FLOAT: u8 = b'd';
pub const TYPE_STRING: u8 = b's';
pub const TYPE_REF: u8 = b'r';
pub const TYPE_LIST: u8 = b'[';
pub const TYPE_RECORD: u8 = b'{';
pub const TYPE_VARIANT: u8 = b'#';
pub const TYPE_VAR: u8 = b'v';
pub const TYPE_FUNCTION: u8 = b'f';
pub const TYPE_MATCH_FUNCTION: u8 = b'm';
pub const TYPE_CLOSURE: u8 = b'c';
pub const TYPE_BYTES: u8 = b'b';
pub const TYPE_HOLE: u8 = b'(';
pub const TYPE_ASSIGN: u8 = b'=';
pub const TYPE_BINOP: u8 = b'+';
pub const TYPE_APPLY: u8 = b' ';
pub const TYPE_WHERE: u8 = b'.';
pub const TYPE_ACCESS: u8 = b'@';
pub const TYPE_SPREAD: u8 = b'S';
pub const TYPE_NAMED_SPREAD: u8 = b'R';

pub const FLAG_REF: u8 = 0x80;

/// A serialization or deserialization failure.
#[derive(Debug, Clone, PartialEq)]
pub enum WireError {
    /// Input ended before the value was complete.
    UnexpectedEnd,
    /// A tag byte that names no type.
    UnknownTag(u8),
    /// The node kind has no wire representation (closureless trees only
    /// carry parser-constructible nodes plus closures).
    Unsupported(&'static str),
    /// Structurally invalid input.
    Corrupt(&'static str),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::UnexpectedEnd => write!(f, "unexpected end of input"),
            WireError::UnknownTag(tag) => write!(f, "unknown tag byte 0x{tag:02x}"),
            WireError::Unsupported(kind) => write!(f, "cannot serialize {kind}"),
            WireError::Corrupt(message) => write!(f, "corrupt input: {message}"),
        }
    }
}

impl std::error::Error for WireError {}

// ── Zig-zag encoding ───────────────────────────────────────────────────

fn zigzag_encode(value: i64) -> u64 {
    ((value as u64) << 1) ^ ((value >> 63) as u64)
}

fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

fn zigzag_encode_big(value: &BigInt) -> BigUint {
    let two = BigInt::from(2);
    let encoded: BigInt = if value.sign() == Sign::Minus {
        -(value * &two) - BigInt::from(1)
    } else {
        value * &two
    };
    encoded
        .to_biguint()
        .expect("zig-zag encoding is non-negative")
}

fn zigzag_decode_big(value: BigUint) -> BigInt {
    let value = BigInt::from(value);
    if value.bit(0) {
        -((value + BigInt::from(1)) / BigInt::from(2))
    } else {
        value / BigInt::from(2)
    }
}

// ── Serialization ──────────────────────────────────────────────────────

/// Serialize an expression tree to bytes.
pub fn serialize(expr: &ExprRef) -> Result<Vec<u8>, WireError> {
    let mut serializer = Serializer::default();
    serializer.write(expr)?;
    Ok(serializer.out)
}

#[derive(Default)]
struct Serializer {
    /// Identity table of already-emitted ref-flagged nodes.
    refs: Vec<*const Expr>,
    out: Vec<u8>,
}

impl Serializer {
    fn ref_index(&self, expr: &ExprRef) -> Option<usize> {
        let ptr = Rc::as_ptr(expr);
        self.refs.iter().position(|entry| *entry == ptr)
    }

    fn add_ref(&mut self, tag: u8, expr: &ExprRef) {
        self.out.push(tag | FLAG_REF);
        self.refs.push(Rc::as_ptr(expr));
    }

    fn write_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                self.out.push(byte | 0x80);
            } else {
                self.out.push(byte);
                break;
            }
        }
    }

    fn write_short(&mut self, value: i64) {
        self.write_varint(zigzag_encode(value));
    }

    fn write_long(&mut self, value: &BigInt) {
        let digits = zigzag_encode_big(value).to_u64_digits();
        self.write_short(digits.len() as i64);
        for digit in digits {
            self.out.extend_from_slice(&digit.to_le_bytes());
        }
    }

    fn write_string(&mut self, value: &str) {
        self.write_short(value.len() as i64);
        self.out.extend_from_slice(value.as_bytes());
    }

    fn write(&mut self, expr: &ExprRef) -> Result<(), WireError> {
        if let Some(index) = self.ref_index(expr) {
            self.out.push(TYPE_REF);
            self.write_short(index as i64);
            return Ok(());
        }
        match &**expr {
            Expr::Int(value) => match value.to_i64() {
                Some(small) => {
                    self.out.push(TYPE_SHORT);
                    self.write_short(small);
                }
                None => {
                    self.out.push(TYPE_LONG);
                    self.write_long(value);
                }
            },
            Expr::Float(value) => {
                self.out.push(TYPE_FLOAT);
                self.out.extend_from_slice(&value.to_le_bytes());
            }
            Expr::String(value) => {
                self.out.push(TYPE_STRING);
                self.write_string(value);
            }
            Expr::Bytes(value) => {
                self.out.push(TYPE_BYTES);
                self.write_short(value.len() as i64);
                self.out.extend_from_slice(value);
            }
            Expr::Hole => self.out.push(TYPE_HOLE),
            Expr::Var(name) => {
                self.out.push(TYPE_VAR);
                self.write_string(name);
            }
            Expr::Spread(None) => self.out.push(TYPE_SPREAD),
            Expr::Spread(Some(name)) => {
                self.out.push(TYPE_NAMED_SPREAD);
                self.write_string(name);
            }
            Expr::List(items) => {
                self.add_ref(TYPE_LIST, expr);
                let items = items.borrow();
                self.write_short(items.len() as i64);
                for item in items.iter() {
                    self.write(item)?;
                }
            }
            Expr::Record(fields) => {
                self.out.push(TYPE_RECORD);
                self.write_short(fields.len() as i64);
                for (key, value) in fields {
                    self.write_string(key);
                    self.write(value)?;
                }
            }
            Expr::Variant { tag, value } => {
                self.out.push(TYPE_VARIANT);
                self.write_string(tag);
                self.write(value)?;
            }
            Expr::Assign { name, value } => {
                self.out.push(TYPE_ASSIGN);
                self.write(name)?;
                self.write(value)?;
            }
            Expr::Binop { op, left, right } => {
                self.out.push(TYPE_BINOP);
                self.write_string(op.to_str());
                self.write(left)?;
                self.write(right)?;
            }
            Expr::Function { arg, body } => {
                self.out.push(TYPE_FUNCTION);
                self.write(arg)?;
                self.write(body)?;
            }
            Expr::MatchFunction(cases) => {
                self.out.push(TYPE_MATCH_FUNCTION);
                self.write_short(cases.len() as i64);
                for case in cases {
                    self.write(&case.pattern)?;
                    self.write(&case.body)?;
                }
            }
            Expr::Apply { func, arg } => {
                self.out.push(TYPE_APPLY);
                self.write(func)?;
                self.write(arg)?;
            }
            Expr::Where { body, binding } => {
                self.out.push(TYPE_WHERE);
                self.write(body)?;
                self.write(binding)?;
            }
            Expr::Access { obj, at } => {
                self.out.push(TYPE_ACCESS);
                self.write(obj)?;
                self.write(at)?;
            }
            Expr::Closure { env, func } => {
                self.add_ref(TYPE_CLOSURE, expr);
                self.write(func)?;
                // Sorted keys keep the output deterministic; the format
                // itself is order-insensitive.
                let entries: Vec<(String, ExprRef)> = {
                    let env = env.borrow();
                    let mut entries: Vec<(String, ExprRef)> =
                        env.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    entries.sort_by(|a, b| a.0.cmp(&b.0));
                    entries
                };
                self.write_short(entries.len() as i64);
                for (key, value) in &entries {
                    self.write_string(key);
                    self.write(value)?;
                }
            }
            Expr::Assert { .. } => return Err(WireError::Unsupported("Assert")),
            Expr::NativeFunction { .. } => return Err(WireError::Unsupported("NativeFunction")),
            Expr::EnvObject(_) => return Err(WireError::Unsupported("EnvObject")),
        }
        Ok(())
    }
}

// ── Deserialization ────────────────────────────────────────────────────

/// Deserialize bytes back into an expression tree.
pub fn deserialize(data: &[u8]) -> Result<ExprRef, WireError> {
    Deserializer::new(data).read_expr()
}

struct Deserializer<'a> {
    data: &'a [u8],
    pos: usize,
    refs: Vec<ExprRef>,
}

impl<'a> Deserializer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Deserializer {
            data,
            pos: 0,
            refs: Vec::new(),
        }
    }

    fn read(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(len).ok_or(WireError::UnexpectedEnd)?;
        if end > self.data.len() {
            return Err(WireError::UnexpectedEnd);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_tag(&mut self) -> Result<(u8, bool), WireError> {
        let byte = self.read(1)?[0];
        Ok((byte & !FLAG_REF, byte & FLAG_REF != 0))
    }

    fn read_varint(&mut self) -> Result<u64, WireError> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read(1)?[0];
            if shift >= 64 {
                return Err(WireError::Corrupt("varint too long"));
            }
            result |= ((byte & 0x7f) as u64) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(result)
    }

    fn read_short(&mut self) -> Result<i64, WireError> {
        Ok(zigzag_decode(self.read_varint()?))
    }

    fn read_len(&mut self) -> Result<usize, WireError> {
        usize::try_from(self.read_short()?).map_err(|_| WireError::Corrupt("negative length"))
    }

    fn read_long(&mut self) -> Result<BigInt, WireError> {
        let count = self.read_len()?;
        let mut value = BigUint::zero();
        let mut digits = Vec::with_capacity(count);
        for _ in 0..count {
            let bytes: [u8; 8] = self.read(8)?.try_into().expect("read returned 8 bytes");
            digits.push(u64::from_le_bytes(bytes));
        }
        for digit in digits.into_iter().rev() {
            value = (value << 64) | BigUint::from(digit);
        }
        Ok(zigzag_decode_big(value))
    }

    fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_len()?;
        let bytes = self.read(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::Corrupt("invalid utf-8"))
    }

    fn read_expr(&mut self) -> Result<ExprRef, WireError> {
        let (tag, is_ref) = self.read_tag()?;
        match tag {
            TYPE_REF => {
                let index = self.read_len()?;
                self.refs
                    .get(index)
                    .cloned()
                    .ok_or(WireError::Corrupt("dangling back-reference"))
            }
            TYPE_SHORT => Ok(Expr::int(self.read_short()?)),
            TYPE_LONG => Ok(Expr::int(self.read_long()?)),
            TYPE_FLOAT => {
                let bytes: [u8; 8] = self.read(8)?.try_into().expect("read returned 8 bytes");
                Ok(Expr::float(f64::from_le_bytes(bytes)))
            }
            TYPE_STRING => Ok(Expr::string(self.read_string()?)),
            TYPE_BYTES => {
                let len = self.read_len()?;
                Ok(Expr::bytes(self.read(len)?.to_vec()))
            }
            TYPE_HOLE => Ok(Expr::hole()),
            TYPE_VAR => Ok(Expr::var(self.read_string()?)),
            TYPE_SPREAD => Ok(Expr::spread(None)),
            TYPE_NAMED_SPREAD => Ok(Expr::spread(Some(self.read_string()?))),
            TYPE_LIST => {
                if !is_ref {
                    return Err(WireError::Corrupt("list without ref flag"));
                }
                let len = self.read_len()?;
                let list = Expr::list(Vec::with_capacity(len));
                self.refs.push(list.clone());
                for _ in 0..len {
                    let item = self.read_expr()?;
                    match &*list {
                        Expr::List(items) => items.borrow_mut().push(item),
                        _ => unreachable!("constructed as a list"),
                    }
                }
                Ok(list)
            }
            TYPE_RECORD => {
                let len = self.read_len()?;
                let mut fields = indexmap::IndexMap::with_capacity(len);
                for _ in 0..len {
                    let key = self.read_string()?;
                    let value = self.read_expr()?;
                    fields.insert(key, value);
                }
                Ok(Expr::record(fields))
            }
            TYPE_VARIANT => {
                let tag = self.read_string()?;
                let value = self.read_expr()?;
                Ok(Expr::variant(tag, value))
            }
            TYPE_ASSIGN => {
                let name = self.read_expr()?;
                if name.as_var().is_none() {
                    return Err(WireError::Corrupt("assignment to non-variable"));
                }
                let value = self.read_expr()?;
                Ok(Expr::assign(name, value))
            }
            TYPE_BINOP => {
                let op_text = self.read_string()?;
                let op = BinopKind::from_str(&op_text)
                    .ok_or(WireError::Corrupt("unknown binary operator"))?;
                let left = self.read_expr()?;
                let right = self.read_expr()?;
                Ok(Expr::binop(op, left, right))
            }
            TYPE_FUNCTION => {
                let arg = self.read_expr()?;
                let body = self.read_expr()?;
                Ok(Expr::function(arg, body))
            }
            TYPE_MATCH_FUNCTION => {
                let len = self.read_len()?;
                let mut cases = Vec::with_capacity(len);
                for _ in 0..len {
                    let pattern = self.read_expr()?;
                    let body = self.read_expr()?;
                    cases.push(MatchCase::new(pattern, body));
                }
                Ok(Expr::match_function(cases))
            }
            TYPE_APPLY => {
                let func = self.read_expr()?;
                let arg = self.read_expr()?;
                Ok(Expr::apply(func, arg))
            }
            TYPE_WHERE => {
                let body = self.read_expr()?;
                let binding = self.read_expr()?;
                Ok(Expr::where_expr(body, binding))
            }
            TYPE_ACCESS => {
                let obj = self.read_expr()?;
                let at = self.read_expr()?;
                Ok(Expr::access(obj, at))
            }
            TYPE_CLOSURE => {
                if !is_ref {
                    return Err(WireError::Corrupt("closure without ref flag"));
                }
                let func = self.read_expr()?;
                if !matches!(&*func, Expr::Function { .. } | Expr::MatchFunction(_)) {
                    return Err(WireError::Corrupt("closure over a non-function"));
                }
                let len = self.read_len()?;
                let closure = Expr::closure(Env::default(), func);
                self.refs.push(closure.clone());
                for _ in 0..len {
                    let key = self.read_string()?;
                    let value = self.read_expr()?;
                    match &*closure {
                        Expr::Closure { env, .. } => {
                            env.borrow_mut().insert(key, value);
                        }
                        _ => unreachable!("constructed as a closure"),
                    }
                }
                Ok(closure)
            }
            other => Err(WireError::UnknownTag(other)),
        }
    }
}
