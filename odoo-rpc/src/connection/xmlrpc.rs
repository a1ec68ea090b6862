//! # XML-RPC wire coding
//!
//! Odoo's legacy endpoints route by service name (`/xmlrpc/2/common`,
//! `/xmlrpc/2/object`) and speak standard XML-RPC: a `<methodCall>` with one
//! `<param>` per argument, answered by a `<methodResponse>` carrying either
//! a single `<param>` or a `<fault>` struct.
//!
//! The coding here covers the element set Odoo actually emits: `i4`/`int`,
//! `boolean`, `double`, `string` (including bare text inside `<value>`),
//! `array`, `struct` and `<nil/>`; `dateTime.iso8601` and `base64` values
//! decode as strings. Character data is escaped with the five predefined XML
//! entities; numeric character references are not interpreted.
use crate::{
    error::Error,
    transport::Headers,
};
use serde_json::{Map, Value};

pub(crate) const PROTOCOL_NAME: &str = "xmlrpc";

const SCALAR_TAGS: [&str; 7] = [
    "i4",
    "int",
    "boolean",
    "double",
    "string",
    "dateTime.iso8601",
    "base64",
];

pub(crate) fn build_body(method: &str, args: &[Value]) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    escape_into(&mut body, method);
    body.push_str("</methodName><params>");
    for arg in args {
        body.push_str("<param>");
        write_value(&mut body, arg);
        body.push_str("</param>");
    }
    body.push_str("</params></methodCall>");
    body
}

pub(crate) fn headers() -> Headers {
    vec![(
        "Content-Type".to_string(),
        "text/xml; charset=utf-8".to_string(),
    )]
}

/// Decodes a raw `<methodResponse>`, extracting the single result value or
/// surfacing the `<fault>`.
pub(crate) fn parse_body(raw: &str) -> Result<Value, Error> {
    match parse_response(raw) {
        Ok(Reply::Value(value)) => Ok(value),
        Ok(Reply::Fault { code, message }) => Err(Error::Remote {
            code,
            message,
            data: None,
        }),
        Err(reason) => Err(Error::Protocol {
            protocol: PROTOCOL_NAME,
            reason,
        }),
    }
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push(if *b { '1' } else { '0' });
            out.push_str("</boolean>");
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push_str(&format!("<int>{i}</int>"));
            } else {
                // u64 beyond i64 range and fractional numbers both travel as
                // doubles.
                let f = n.as_f64().unwrap_or_default();
                out.push_str(&format!("<double>{f}</double>"));
            }
        }
        Value::String(s) => {
            out.push_str("<string>");
            escape_into(out, s);
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Object(map) => {
            out.push_str("<struct>");
            for (name, member) in map {
                out.push_str("<member><name>");
                escape_into(out, name);
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        match &rest[1..semi] {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                // Unknown entity, keep it verbatim.
                out.push_str(&rest[..=semi]);
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

enum Reply {
    Value(Value),
    Fault { code: i64, message: String },
}

fn parse_response(raw: &str) -> Result<Reply, String> {
    let mut cur = Cursor::new(raw);
    cur.skip_ws();
    cur.skip_prolog();
    cur.skip_ws();
    cur.expect("<methodResponse>")?;
    cur.skip_ws();

    if cur.eat("<params>") {
        cur.skip_ws();
        cur.expect("<param>")?;
        cur.skip_ws();
        let value = parse_value(&mut cur)?;
        cur.skip_ws();
        cur.expect("</param>")?;
        cur.skip_ws();
        cur.expect("</params>")?;
        cur.skip_ws();
        cur.expect("</methodResponse>")?;
        return Ok(Reply::Value(value));
    }

    if cur.eat("<fault>") {
        cur.skip_ws();
        let value = parse_value(&mut cur)?;
        cur.skip_ws();
        cur.expect("</fault>")?;
        cur.skip_ws();
        cur.expect("</methodResponse>")?;
        let Value::Object(map) = value else {
            return Err("fault payload is not a struct".to_string());
        };
        let code = map
            .get("faultCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| "fault struct is missing 'faultCode'".to_string())?;
        let message = map
            .get("faultString")
            .and_then(Value::as_str)
            .ok_or_else(|| "fault struct is missing 'faultString'".to_string())?
            .to_string();
        return Ok(Reply::Fault { code, message });
    }

    Err("method response carries neither '<params>' nor '<fault>'".to_string())
}

fn parse_value(cur: &mut Cursor<'_>) -> Result<Value, String> {
    if cur.eat("<value/>") {
        return Ok(Value::String(String::new()));
    }
    cur.expect("<value>")?;
    let text = cur.take_until_lt();
    if cur.peek_is("</value>") {
        cur.expect("</value>")?;
        // Untyped character data inside <value> is a string.
        return Ok(Value::String(unescape(text)));
    }
    if !text.trim().is_empty() {
        return Err("mixed content inside '<value>'".to_string());
    }
    let inner = parse_typed(cur)?;
    cur.skip_ws();
    cur.expect("</value>")?;
    Ok(inner)
}

fn parse_typed(cur: &mut Cursor<'_>) -> Result<Value, String> {
    if cur.eat("<nil/>") {
        return Ok(Value::Null);
    }
    for tag in SCALAR_TAGS {
        if let Some(text) = cur.scalar(tag)? {
            return scalar_value(tag, &text);
        }
    }
    if cur.peek_is("<array>") {
        return parse_array(cur);
    }
    if cur.peek_is("<struct>") {
        return parse_struct(cur);
    }
    Err(format!("unsupported value element near '{}'", cur.context()))
}

fn scalar_value(tag: &str, text: &str) -> Result<Value, String> {
    match tag {
        "i4" | "int" => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("invalid integer literal '{}'", text.trim())),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(format!("invalid boolean literal '{other}'")),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
            .ok_or_else(|| format!("invalid double literal '{}'", text.trim())),
        _ => Ok(Value::String(unescape(text))),
    }
}

fn parse_array(cur: &mut Cursor<'_>) -> Result<Value, String> {
    cur.expect("<array>")?;
    cur.skip_ws();
    if cur.eat("<data/>") {
        cur.skip_ws();
        cur.expect("</array>")?;
        return Ok(Value::Array(Vec::new()));
    }
    cur.expect("<data>")?;
    cur.skip_ws();
    let mut items = Vec::new();
    while cur.peek_is("<value>") || cur.peek_is("<value/>") {
        items.push(parse_value(cur)?);
        cur.skip_ws();
    }
    cur.expect("</data>")?;
    cur.skip_ws();
    cur.expect("</array>")?;
    Ok(Value::Array(items))
}

fn parse_struct(cur: &mut Cursor<'_>) -> Result<Value, String> {
    cur.expect("<struct>")?;
    cur.skip_ws();
    let mut map = Map::new();
    while cur.eat("<member>") {
        cur.skip_ws();
        cur.expect("<name>")?;
        let name = unescape(cur.take_until_lt());
        cur.expect("</name>")?;
        cur.skip_ws();
        let value = parse_value(cur)?;
        cur.skip_ws();
        cur.expect("</member>")?;
        cur.skip_ws();
        map.insert(name, value);
    }
    cur.expect("</struct>")?;
    Ok(Value::Object(map))
}

/// Byte cursor over the response, specialized to XML-RPC's fixed element
/// set. Not a general XML parser: no attributes, comments or CDATA.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn skip_prolog(&mut self) {
        if self.peek_is("<?xml") {
            match self.rest().find("?>") {
                Some(idx) => self.pos += idx + 2,
                None => self.pos = self.input.len(),
            }
        }
    }

    fn peek_is(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.peek_is(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, literal: &str) -> Result<(), String> {
        if self.eat(literal) {
            Ok(())
        } else {
            Err(format!("expected '{literal}' near '{}'", self.context()))
        }
    }

    /// Consumes character data up to the next element, without unescaping.
    fn take_until_lt(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest.find('<').unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Consumes `<tag>text</tag>` or the empty `<tag/>`, returning the raw
    /// text, or `None` if the next element is something else.
    fn scalar(&mut self, tag: &str) -> Result<Option<String>, String> {
        if self.eat(&format!("<{tag}/>")) {
            return Ok(Some(String::new()));
        }
        if !self.eat(&format!("<{tag}>")) {
            return Ok(None);
        }
        let text = self.take_until_lt().to_string();
        self.expect(&format!("</{tag}>"))?;
        Ok(Some(text))
    }

    /// A short slice of the remaining input for error messages.
    fn context(&self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .take(24)
            .last()
            .map(|(idx, ch)| idx + ch.len_utf8())
            .unwrap_or(0);
        &rest[..end]
    }
}
