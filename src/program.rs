//! Program document model and loader.
//!
//! Parses the structured IR document (root `program`, ordered `instruction`
//! children, positional `argN` children) into an in-memory [`Program`] and
//! performs the document-integrity check of spec.md §4.5. This is the one
//! module in the crate without a direct teacher counterpart — the
//! teacher's "document" is source text run through its own lexer/parser,
//! which is out of scope here (see DESIGN.md).

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::errors::DocumentError;
use crate::frame::VarRef;
use crate::value::decode_string_escapes;

/// One positional argument, already decoded to its runtime representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Var(VarRef),
    Int(i64),
    Str(String),
    Bool(bool),
    Nil,
    Label(String),
    /// A type-name literal, as used by `READ`'s second argument.
    Type(String),
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub order: i64,
    pub opcode: String,
    pub args: Vec<Argument>,
}

impl Instruction {
    /// The sole label-name argument of a `LABEL` instruction, if any.
    pub fn label_name(&self) -> Option<&str> {
        match self.args.first() {
            Some(Argument::Label(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

/// A bare element of the raw XML tree, before any integrity checking.
struct RawElement {
    tag: String,
    attrs: HashMap<String, String>,
    text: Option<String>,
    children: Vec<RawElement>,
}

fn parse_xml_tree(xml_text: &str) -> Result<RawElement, DocumentError> {
    let mut reader = Reader::from_str(xml_text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| DocumentError::NotWellFormed(e.to_string()))? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let mut attrs = HashMap::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| DocumentError::NotWellFormed(e.to_string()))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| DocumentError::NotWellFormed(e.to_string()))?
                        .to_string();
                    attrs.insert(key, value);
                }
                stack.push(RawElement { tag, attrs, text: None, children: Vec::new() });
            }
            Event::Empty(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let mut attrs = HashMap::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| DocumentError::NotWellFormed(e.to_string()))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr
                        .decode_and_unescape_value(reader.decoder())
                        .map_err(|e| DocumentError::NotWellFormed(e.to_string()))?
                        .to_string();
                    attrs.insert(key, value);
                }
                let elem = RawElement { tag, attrs, text: None, children: Vec::new() };
                attach(&mut stack, &mut root, elem)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| DocumentError::NotWellFormed(e.to_string()))?.to_string();
                if let Some(top) = stack.last_mut() {
                    top.text = Some(text);
                }
            }
            Event::End(_) => {
                let elem = stack.pop().ok_or_else(|| DocumentError::NotWellFormed("unbalanced tags".to_string()))?;
                attach(&mut stack, &mut root, elem)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| DocumentError::NotWellFormed("empty document".to_string()))
}

fn attach(stack: &mut Vec<RawElement>, root: &mut Option<RawElement>, elem: RawElement) -> Result<(), DocumentError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(elem);
    } else if root.is_none() {
        *root = Some(elem);
    } else {
        return Err(DocumentError::NotWellFormed("multiple root elements".to_string()));
    }
    Ok(())
}

/// Decode one `argN` element into its runtime [`Argument`].
fn decode_argument(elem: &RawElement) -> Result<Argument, DocumentError> {
    let ty = elem
        .attrs
        .get("type")
        .ok_or_else(|| DocumentError::Syntactic("argument missing 'type' attribute".to_string()))?;
    let text = elem.text.clone().unwrap_or_default();

    match ty.as_str() {
        "var" => VarRef::parse(&text)
            .map(Argument::Var)
            .ok_or_else(|| DocumentError::Syntactic(format!("malformed variable reference '{text}'"))),
        "int" => text
            .trim()
            .parse::<i64>()
            .map(Argument::Int)
            .map_err(|_| DocumentError::Syntactic(format!("'{text}' is not a valid integer literal"))),
        "string" => Ok(Argument::Str(decode_string_escapes(&text))),
        "bool" => match text.as_str() {
            "true" => Ok(Argument::Bool(true)),
            "false" => Ok(Argument::Bool(false)),
            other => Err(DocumentError::Syntactic(format!("'{other}' is not a valid bool literal"))),
        },
        "nil" => Ok(Argument::Nil),
        "label" => Ok(Argument::Label(text)),
        "type" => Ok(Argument::Type(text)),
        other => Err(DocumentError::Syntactic(format!("unknown argument type '{other}'"))),
    }
}

/// Validate one instruction's children: names must be `arg1`, `arg2`, ...
/// in ascending order once sorted lexicographically by tag name (spec.md
/// §4.5 — matching the reference's `sorted(instruction, key=tag)` pass).
fn decode_instruction_args(children: &[RawElement]) -> Result<Vec<Argument>, DocumentError> {
    let mut sorted: Vec<&RawElement> = children.iter().collect();
    sorted.sort_by(|a, b| a.tag.cmp(&b.tag));

    let mut args = Vec::with_capacity(sorted.len());
    for (i, child) in sorted.iter().enumerate() {
        let expected = format!("arg{}", i + 1);
        if child.tag != expected {
            return Err(DocumentError::Syntactic(format!(
                "expected argument element '{expected}', found '{}'",
                child.tag
            )));
        }
        args.push(decode_argument(child)?);
    }
    Ok(args)
}

/// Parse and integrity-check the document, producing the order-sorted
/// instruction sequence that forms the execution program.
pub fn load_program(xml_text: &str) -> Result<Program, DocumentError> {
    let root = parse_xml_tree(xml_text)?;

    if root.tag != "program" {
        return Err(DocumentError::Syntactic(format!("root element must be 'program', found '{}'", root.tag)));
    }

    let mut seen_orders = std::collections::HashSet::new();
    let mut instructions = Vec::with_capacity(root.children.len());

    for elem in &root.children {
        if elem.tag != "instruction" {
            return Err(DocumentError::Syntactic(format!("expected 'instruction' element, found '{}'", elem.tag)));
        }
        let order_text = elem
            .attrs
            .get("order")
            .ok_or_else(|| DocumentError::Syntactic("instruction missing 'order' attribute".to_string()))?;
        let order: i64 = order_text
            .parse()
            .map_err(|_| DocumentError::Syntactic(format!("'{order_text}' is not a valid instruction order")))?;
        if order <= 0 {
            return Err(DocumentError::Syntactic(format!("instruction order {order} must be positive")));
        }
        if !seen_orders.insert(order) {
            return Err(DocumentError::Syntactic(format!("duplicate instruction order {order}")));
        }

        let opcode = elem
            .attrs
            .get("opcode")
            .ok_or_else(|| DocumentError::Syntactic("instruction missing 'opcode' attribute".to_string()))?;
        if opcode.is_empty() {
            return Err(DocumentError::Syntactic("instruction opcode must not be empty".to_string()));
        }

        let args = decode_instruction_args(&elem.children)?;
        instructions.push(Instruction { order, opcode: opcode.to_uppercase(), args });
    }

    instructions.sort_by_key(|inst| inst.order);
    Ok(Program { instructions })
}
