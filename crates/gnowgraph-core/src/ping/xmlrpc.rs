//! The small subset of XML-RPC the pingers speak: string parameters out,
//! scalars and structs back.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

use super::PingError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Int(i32),
    Bool(bool),
    Struct(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }
}

/// Builds a `methodCall` document with string parameters.
pub fn method_call(method: &str, params: &[&str]) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?>\n<methodCall>\n");
    body.push_str(&format!("<methodName>{}</methodName>\n<params>\n", escape(method)));
    for param in params {
        body.push_str(&format!(
            "<param><value><string>{}</string></value></param>\n",
            escape(param)
        ));
    }
    body.push_str("</params>\n</methodCall>\n");
    body
}

/// An element of the response document with its unescaped text.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn malformed(err: impl std::fmt::Display) -> PingError {
    PingError::Parse(err.to_string())
}

fn read_document(xml: &str) -> Result<Element, PingError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(Element::named(start.local_name().as_ref())),
            Event::Empty(start) => {
                let element = Element::named(start.local_name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| malformed("unbalanced end tag"))?;
                let parent = stack
                    .last_mut()
                    .ok_or_else(|| malformed("unbalanced end tag"))?;
                parent.children.push(element);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(malformed)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(malformed("unexpected end of document")),
    }
}

fn parse_value(value: &Element) -> Result<Value, PingError> {
    let typed = match value.children.first() {
        Some(typed) => typed,
        None => return Ok(Value::String(value.text.trim().to_string())),
    };

    match typed.name.as_str() {
        "string" => Ok(Value::String(typed.text.clone())),
        "boolean" => Ok(Value::Bool(typed.text.trim() == "1")),
        "int" | "i4" => typed
            .text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| PingError::Parse(format!("not an integer: {}", typed.text.trim()))),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| malformed("struct member without a name"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| malformed("struct member without a value"))?;
                members.insert(name.text.trim().to_string(), parse_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(PingError::Parse(format!("unsupported value: <{}>", other))),
    }
}

/// Parses a `methodResponse`. Faults become [`PingError::Fault`].
pub fn parse_response(xml: &str) -> Result<Value, PingError> {
    let document = read_document(xml)?;
    let response = document
        .child("methodResponse")
        .ok_or_else(|| malformed("not a methodResponse"))?;

    if let Some(fault) = response.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| malformed("fault without a value"))?;
        let value = parse_value(value)?;
        let code = match value.get("faultCode") {
            Some(Value::Int(code)) => *code,
            _ => 0,
        };
        let message = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(PingError::Fault { code, message });
    }

    let value = response
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| malformed("no response parameter"))?;
    parse_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_call_escapes() {
        let body = method_call("weblogUpdates.ping", &["Tom & Jerry", "http://a/?x=<1>"]);
        assert!(body.contains("<methodName>weblogUpdates.ping</methodName>"));
        assert!(body.contains("<string>Tom &amp; Jerry</string>"));
        assert!(body.contains("<string>http://a/?x=&lt;1&gt;</string>"));
    }

    #[test]
    fn test_parse_struct_response() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse><params><param><value><struct>
  <member><name>flerror</name><value><boolean>0</boolean></value></member>
  <member><name>message</name><value><string>Thanks for the ping.</string></value></member>
</struct></value></param></params></methodResponse>"#;
        let value = parse_response(xml).unwrap();
        assert_eq!(value.get("flerror").and_then(Value::as_bool), Some(false));
        assert_eq!(value.get("message").and_then(Value::as_str), Some("Thanks for the ping."));
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<methodResponse><fault><value><struct>
  <member><name>faultCode</name><value><int>48</int></value></member>
  <member><name>faultString</name><value><string>already registered</string></value></member>
</struct></value></fault></methodResponse>"#;
        match parse_response(xml) {
            Err(PingError::Fault { code, message }) => {
                assert_eq!(code, 48);
                assert_eq!(message, "already registered");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_string() {
        let xml = "<methodResponse><params><param><value>Pingback registered</value></param></params></methodResponse>";
        assert_eq!(
            parse_response(xml).unwrap(),
            Value::String("Pingback registered".to_string())
        );
    }

    #[test]
    fn test_parse_nested_struct() {
        let xml = r#"<methodResponse><params><param><value><struct>
  <member><name>outer</name><value><struct>
    <member><name>inner</name><value><string>deep</string></value></member>
  </struct></value></member>
  <member><name>after</name><value><int>2</int></value></member>
</struct></value></param></params></methodResponse>"#;
        let value = parse_response(xml).unwrap();
        let outer = value.get("outer").unwrap();
        assert_eq!(outer.get("inner").and_then(Value::as_str), Some("deep"));
        assert_eq!(value.get("after"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_parse_unescapes_text() {
        let xml = "<methodResponse><params><param><value><string>Tom &amp; Jerry &lt;3</string></value></param></params></methodResponse>";
        assert_eq!(
            parse_response(xml).unwrap(),
            Value::String("Tom & Jerry <3".to_string())
        );
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(
            parse_response("<methodResponse><params>"),
            Err(PingError::Parse(_))
        ));
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(PingError::Parse(_))
        ));
    }
}
