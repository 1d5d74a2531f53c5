//! `BREAK`: dump the current PC and all three frames to standard error.
//! A pure diagnostic — it never touches control flow or program state.

use std::io::Write;

use crate::frame::FrameStore;
use crate::value::Value;

pub fn dump(pc: usize, frames: &FrameStore, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "-- BREAK at instruction {pc} --")?;
    writeln!(out, "-- GLOBAL FRAME --")?;
    for (name, value) in frames.dump_global() {
        dump_binding(out, name, value)?;
    }
    writeln!(out, "-- LOCAL FRAMES --")?;
    for scope in frames.dump_locals() {
        writeln!(out, "---")?;
        for (name, value) in scope {
            dump_binding(out, name, value)?;
        }
    }
    writeln!(out, "-- TEMPORARY FRAME --")?;
    if let Some(scope) = frames.dump_temporary() {
        for (name, value) in scope {
            dump_binding(out, name, value)?;
        }
    }
    Ok(())
}

fn dump_binding(out: &mut impl Write, name: &str, value: &Value) -> std::io::Result<()> {
    let type_name = if value.is_undefined() { "undefined" } else { value.type_name() };
    writeln!(out, "{name} {type_name} {}", value.render())
}
