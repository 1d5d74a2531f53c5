//! The fetch/decode/execute/advance dispatcher (spec.md §4.3) and the
//! per-opcode handlers that weren't pulled out into `ops/*.rs`.

use std::io::Write;

use crate::callstack::CallStack;
use crate::errors::InterpreterError;
use crate::frame::{FrameStore, VarRef};
use crate::input::InputSource;
use crate::labels::LabelTable;
use crate::ops;
use crate::program::{Argument, Instruction, Program};
use crate::value::Value;

/// What the dispatcher should do after one instruction has executed.
enum Signal {
    Continue,
    Halt(i32),
}

/// Owns every piece of mutable runtime state plus the two output streams
/// (`WRITE` -> `out`, `DPRINT`/`BREAK` -> `err`), generic so tests can
/// capture both in an in-memory buffer instead of the real process streams.
pub struct Interpreter<O: Write, E: Write> {
    program: Program,
    labels: LabelTable,
    frames: FrameStore,
    stack: crate::stack::DataStack,
    calls: CallStack,
    input: InputSource,
    pc: usize,
    out: O,
    err: E,
}

impl<O: Write, E: Write> Interpreter<O, E> {
    pub fn new(program: Program, input: InputSource, out: O, err: E) -> Result<Self, crate::labels::LabelTableError> {
        let labels = LabelTable::build(
            program
                .instructions
                .iter()
                .enumerate()
                .map(|(pc, inst)| (pc, inst.opcode.as_str(), inst.label_name())),
        )?;
        Ok(Self {
            program,
            labels,
            frames: FrameStore::new(),
            stack: crate::stack::DataStack::new(),
            calls: CallStack::new(),
            input,
            pc: 0,
            out,
            err,
        })
    }

    /// Run until `EXIT`, or the PC runs off the end of the program (success).
    pub fn run(&mut self) -> Result<i32, InterpreterError> {
        loop {
            if self.pc >= self.program.instructions.len() {
                return Ok(0);
            }
            log::trace!("pc={} opcode={}", self.pc, self.program.instructions[self.pc].opcode);
            match self.execute_current()? {
                Signal::Continue => self.pc += 1,
                Signal::Halt(code) => return Ok(code),
            }
        }
    }

    fn current(&self) -> Instruction {
        self.program.instructions[self.pc].clone()
    }

    /// Resolve an argument to a `Value`, following `var` references through
    /// the frame store. Not valid for `Label`/`Type` arguments.
    fn resolve(&self, arg: &Argument) -> Result<Value, InterpreterError> {
        match arg {
            Argument::Var(v) => Ok(self.frames.get(v)?.clone()),
            Argument::Int(i) => Ok(Value::Int(*i)),
            Argument::Str(s) => Ok(Value::Str(s.clone())),
            Argument::Bool(b) => Ok(Value::Bool(*b)),
            Argument::Nil => Ok(Value::Nil),
            Argument::Label(_) | Argument::Type(_) => unreachable!("not a value-producing argument"),
        }
    }

    fn require_var(&self, inst: &Instruction, index: usize) -> Result<&VarRef, InterpreterError> {
        match &inst.args[index] {
            Argument::Var(v) => Ok(v),
            _ => Err(InterpreterError::BadArgShape {
                opcode: inst.opcode.clone(),
                pc: self.pc,
                detail: format!("argument {} must be a variable reference", index + 1),
            }),
        }
    }

    fn require_label(&self, inst: &Instruction, index: usize) -> Result<&str, InterpreterError> {
        match &inst.args[index] {
            Argument::Label(name) => Ok(name.as_str()),
            _ => Err(InterpreterError::BadArgShape {
                opcode: inst.opcode.clone(),
                pc: self.pc,
                detail: format!("argument {} must be a label", index + 1),
            }),
        }
    }

    fn check_arity(&self, inst: &Instruction, expected: usize) -> Result<(), InterpreterError> {
        if inst.args.len() != expected {
            return Err(InterpreterError::ArgCount {
                opcode: inst.opcode.clone(),
                expected,
                actual: inst.args.len(),
                pc: self.pc,
            });
        }
        Ok(())
    }

    fn require_defined(&self, opcode: &str, value: Value) -> Result<Value, InterpreterError> {
        if value.is_undefined() {
            Err(InterpreterError::MissingValue(format!("operand of '{opcode}' is uninitialized")))
        } else {
            Ok(value)
        }
    }

    fn require_int(&self, inst: &Instruction, value: &Value) -> Result<i64, InterpreterError> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(wrong_type(inst, self.pc, format!("expected int, found {}", describe(value)))),
        }
    }

    fn require_bool(&self, inst: &Instruction, value: &Value) -> Result<bool, InterpreterError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(wrong_type(inst, self.pc, format!("expected bool, found {}", describe(value)))),
        }
    }

    fn require_str(&self, inst: &Instruction, value: &Value) -> Result<String, InterpreterError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(wrong_type(inst, self.pc, format!("expected string, found {}", describe(value)))),
        }
    }

    /// Validates that `target`'s frame and name already exist, without
    /// reading or altering its value. Per spec.md §7, frame/name existence
    /// (55/54) precedes any operand's definedness/type check — the
    /// reference calls `get_arg_info(args[0])` on the target before any
    /// other argument, so the target's existence must be probed before an
    /// operand is ever resolved.
    fn require_target_exists(&self, target: &VarRef) -> Result<(), InterpreterError> {
        self.frames.get(target)?;
        Ok(())
    }

    fn execute_current(&mut self) -> Result<Signal, InterpreterError> {
        let inst = self.current();
        match inst.opcode.as_str() {
            "CREATEFRAME" => {
                self.check_arity(&inst, 0)?;
                self.frames.create_frame();
            }
            "PUSHFRAME" => {
                self.check_arity(&inst, 0)?;
                self.frames.push_frame()?;
            }
            "POPFRAME" => {
                self.check_arity(&inst, 0)?;
                self.frames.pop_frame()?;
            }
            "DEFVAR" => {
                self.check_arity(&inst, 1)?;
                let var = self.require_var(&inst, 0)?.clone();
                self.frames.define(&var)?;
            }
            "MOVE" => {
                self.check_arity(&inst, 2)?;
                let target = self.require_var(&inst, 0)?.clone();
                self.require_target_exists(&target)?;
                let value = self.resolve(&inst.args[1])?;
                let value = self.require_defined("MOVE", value)?;
                self.frames.set(&target, value)?;
            }
            "PUSHS" => {
                self.check_arity(&inst, 1)?;
                let value = self.resolve(&inst.args[0])?;
                let value = self.require_defined("PUSHS", value)?;
                self.stack.push(value);
            }
            "POPS" => {
                self.check_arity(&inst, 1)?;
                let target = self.require_var(&inst, 0)?.clone();
                self.require_target_exists(&target)?;
                let value = self.stack.pop()?;
                self.frames.set(&target, value)?;
            }
            "ADD" | "SUB" | "MUL" | "IDIV" => self.exec_arithmetic(&inst)?,
            "LT" | "GT" | "EQ" => self.exec_relational(&inst)?,
            "AND" | "OR" => self.exec_binary_logical(&inst)?,
            "NOT" => self.exec_not(&inst)?,
            "TYPE" => self.exec_type(&inst)?,
            "INT2CHAR" => self.exec_int2char(&inst)?,
            "STRI2INT" => self.exec_stri2int(&inst)?,
            "CONCAT" => self.exec_concat(&inst)?,
            "STRLEN" => self.exec_strlen(&inst)?,
            "GETCHAR" => self.exec_getchar(&inst)?,
            "SETCHAR" => self.exec_setchar(&inst)?,
            "WRITE" => self.exec_write(&inst, false)?,
            "DPRINT" => self.exec_write(&inst, true)?,
            "READ" => self.exec_read(&inst)?,
            "LABEL" => {
                self.check_arity(&inst, 1)?;
            }
            "JUMP" => {
                self.check_arity(&inst, 1)?;
                let label = self.require_label(&inst, 0)?;
                self.pc = self.labels.resolve(label)?;
            }
            "JUMPIFEQ" | "JUMPIFNEQ" => self.exec_conditional_jump(&inst)?,
            "CALL" => {
                self.check_arity(&inst, 1)?;
                let label = self.require_label(&inst, 0)?;
                let target = self.labels.resolve(label)?;
                self.calls.push(self.pc);
                self.pc = target;
            }
            "RETURN" => {
                self.check_arity(&inst, 0)?;
                self.pc = self.calls.pop()?;
            }
            "EXIT" => {
                self.check_arity(&inst, 1)?;
                let value = self.resolve(&inst.args[0])?;
                let value = self.require_defined("EXIT", value)?;
                let code = self.require_int(&inst, &value)?;
                if !(0..=49).contains(&code) {
                    return Err(InterpreterError::BadValue {
                        opcode: "EXIT".to_string(),
                        pc: self.pc,
                        detail: format!("exit code {code} is outside [0, 49]"),
                    });
                }
                return Ok(Signal::Halt(code as i32));
            }
            "BREAK" => {
                self.check_arity(&inst, 0)?;
                let _ = ops::diagnostics::dump(self.pc, &self.frames, &mut self.err);
            }
            other => return Err(InterpreterError::UnknownOpcode(other.to_string(), self.pc)),
        }
        Ok(Signal::Continue)
    }

    fn exec_arithmetic(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let a = self.resolve(&inst.args[1])?;
        let b = self.resolve(&inst.args[2])?;
        let a = self.require_defined(&inst.opcode, a)?;
        let b = self.require_defined(&inst.opcode, b)?;
        let a = self.require_int(inst, &a)?;
        let b = self.require_int(inst, &b)?;
        let result = match inst.opcode.as_str() {
            "ADD" => ops::arithmetic::add(a, b),
            "SUB" => ops::arithmetic::sub(a, b),
            "MUL" => ops::arithmetic::mul(a, b),
            "IDIV" => ops::arithmetic::idiv(a, b, &inst.opcode, self.pc)?,
            _ => unreachable!(),
        };
        self.frames.set(&target, Value::Int(result))?;
        Ok(())
    }

    fn exec_relational(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let a = self.resolve(&inst.args[1])?;
        let b = self.resolve(&inst.args[2])?;

        let result = match inst.opcode.as_str() {
            "EQ" => {
                let a = self.require_defined("EQ", a)?;
                let b = self.require_defined("EQ", b)?;
                if !a.comparable_for_equality(&b) {
                    return Err(wrong_type(inst, self.pc, format!("cannot compare {} and {}", describe(&a), describe(&b))));
                }
                ops::relational::equal(&a, &b)
            }
            "LT" | "GT" => {
                let a = self.require_defined(&inst.opcode, a)?;
                let b = self.require_defined(&inst.opcode, b)?;
                if matches!(a, Value::Nil) || matches!(b, Value::Nil) {
                    return Err(wrong_type(inst, self.pc, "nil is not ordered"));
                }
                if !a.comparable_for_order(&b) {
                    return Err(wrong_type(inst, self.pc, format!("cannot compare {} and {}", describe(&a), describe(&b))));
                }
                if inst.opcode == "LT" { ops::relational::less_than(&a, &b) } else { ops::relational::greater_than(&a, &b) }
            }
            _ => unreachable!(),
        };
        self.frames.set(&target, Value::Bool(result))?;
        Ok(())
    }

    fn exec_binary_logical(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let a = self.resolve(&inst.args[1])?;
        let b = self.resolve(&inst.args[2])?;
        let a = self.require_defined(&inst.opcode, a)?;
        let b = self.require_defined(&inst.opcode, b)?;
        let a = self.require_bool(inst, &a)?;
        let b = self.require_bool(inst, &b)?;
        let result = if inst.opcode == "AND" { ops::logical::and(a, b) } else { ops::logical::or(a, b) };
        self.frames.set(&target, Value::Bool(result))?;
        Ok(())
    }

    fn exec_not(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 2)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let a = self.resolve(&inst.args[1])?;
        let a = self.require_defined(&inst.opcode, a)?;
        let a = self.require_bool(inst, &a)?;
        self.frames.set(&target, Value::Bool(ops::logical::not(a)))?;
        Ok(())
    }

    fn exec_type(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 2)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let value = self.resolve(&inst.args[1])?;
        self.frames.set(&target, Value::Str(value.type_name().to_string()))?;
        Ok(())
    }

    fn exec_int2char(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 2)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let code = self.resolve(&inst.args[1])?;
        let code = self.require_defined(&inst.opcode, code)?;
        let code = self.require_int(inst, &code)?;
        let s = ops::strings::int2char(code, self.pc)?;
        self.frames.set(&target, Value::Str(s))?;
        Ok(())
    }

    fn exec_stri2int(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let s = self.resolve(&inst.args[1])?;
        let i = self.resolve(&inst.args[2])?;
        let s = self.require_defined(&inst.opcode, s)?;
        let i = self.require_defined(&inst.opcode, i)?;
        let s = self.require_str(inst, &s)?;
        let i = self.require_int(inst, &i)?;
        let code = ops::strings::stri2int(&s, i, self.pc)?;
        self.frames.set(&target, Value::Int(code))?;
        Ok(())
    }

    fn exec_concat(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let a = self.resolve(&inst.args[1])?;
        let b = self.resolve(&inst.args[2])?;
        let a = self.require_defined(&inst.opcode, a)?;
        let b = self.require_defined(&inst.opcode, b)?;
        let a = self.require_str(inst, &a)?;
        let b = self.require_str(inst, &b)?;
        self.frames.set(&target, Value::Str(ops::strings::concat(&a, &b)))?;
        Ok(())
    }

    fn exec_strlen(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 2)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let s = self.resolve(&inst.args[1])?;
        let s = self.require_defined(&inst.opcode, s)?;
        let s = self.require_str(inst, &s)?;
        self.frames.set(&target, Value::Int(ops::strings::strlen(&s)))?;
        Ok(())
    }

    fn exec_getchar(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let s = self.resolve(&inst.args[1])?;
        let i = self.resolve(&inst.args[2])?;
        let s = self.require_defined(&inst.opcode, s)?;
        let i = self.require_defined(&inst.opcode, i)?;
        let s = self.require_str(inst, &s)?;
        let i = self.require_int(inst, &i)?;
        let c = ops::strings::getchar(&s, i, self.pc)?;
        self.frames.set(&target, Value::Str(c))?;
        Ok(())
    }

    fn exec_setchar(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let target = self.require_var(inst, 0)?.clone();
        let current = self.frames.get(&target)?.clone();
        let i = self.resolve(&inst.args[1])?;
        let c = self.resolve(&inst.args[2])?;
        let i = self.require_defined(&inst.opcode, i)?;
        let c = self.require_defined(&inst.opcode, c)?;
        let i = self.require_int(inst, &i)?;
        let c = self.require_str(inst, &c)?;
        let current = self.require_defined(&inst.opcode, current)?;
        let current = self.require_str(inst, &current)?;
        let updated = ops::strings::setchar(&current, i, &c, self.pc)?;
        self.frames.set(&target, Value::Str(updated))?;
        Ok(())
    }

    fn exec_write(&mut self, inst: &Instruction, to_stderr: bool) -> Result<(), InterpreterError> {
        self.check_arity(inst, 1)?;
        let value = self.resolve(&inst.args[0])?;
        let value = self.require_defined(if to_stderr { "DPRINT" } else { "WRITE" }, value)?;
        let text = value.render();
        if to_stderr {
            let _ = write!(self.err, "{text}");
        } else {
            let _ = write!(self.out, "{text}");
        }
        Ok(())
    }

    fn exec_read(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 2)?;
        let target = self.require_var(inst, 0)?.clone();
        self.require_target_exists(&target)?;
        let type_name = match &inst.args[1] {
            Argument::Type(t) => t.clone(),
            _ => {
                return Err(InterpreterError::BadArgShape {
                    opcode: inst.opcode.clone(),
                    pc: self.pc,
                    detail: "second argument must be a type literal".to_string(),
                })
            }
        };
        if !["int", "string", "bool"].contains(&type_name.as_str()) {
            return Err(wrong_type(inst, self.pc, format!("'{type_name}' is not a readable type")));
        }

        let line = self.input.read_line().unwrap_or(None);
        let value = match line {
            None => Value::Nil,
            Some(line) => match type_name.as_str() {
                "int" => line.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Nil),
                "bool" => Value::Bool(line.eq_ignore_ascii_case("true")),
                "string" => Value::Str(crate::value::decode_string_escapes(&line)),
                _ => unreachable!(),
            },
        };
        self.frames.set(&target, value)?;
        Ok(())
    }

    fn exec_conditional_jump(&mut self, inst: &Instruction) -> Result<(), InterpreterError> {
        self.check_arity(inst, 3)?;
        let label = self.require_label(inst, 0)?;
        let target = self.labels.resolve(label)?;
        let a = self.resolve(&inst.args[1])?;
        let b = self.resolve(&inst.args[2])?;
        let a = self.require_defined(&inst.opcode, a)?;
        let b = self.require_defined(&inst.opcode, b)?;
        if !a.comparable_for_equality(&b) {
            return Err(wrong_type(inst, self.pc, format!("cannot compare {} and {}", describe(&a), describe(&b))));
        }
        let eq = ops::relational::equal(&a, &b);
        let take_branch = if inst.opcode == "JUMPIFEQ" { eq } else { !eq };
        if take_branch {
            self.pc = target;
        }
        Ok(())
    }
}

fn wrong_type(inst: &Instruction, pc: usize, detail: impl Into<String>) -> InterpreterError {
    InterpreterError::WrongType { opcode: inst.opcode.clone(), pc, detail: detail.into() }
}

fn describe(value: &Value) -> &'static str {
    if value.is_undefined() { "undefined" } else { value.type_name() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Argument, Instruction};

    fn inst(order: i64, opcode: &str, args: Vec<Argument>) -> Instruction {
        Instruction { order, opcode: opcode.to_string(), args }
    }

    fn var(frame: &str, name: &str) -> Argument {
        Argument::Var(VarRef::parse(&format!("{frame}@{name}")).unwrap())
    }

    fn run(instructions: Vec<Instruction>) -> (String, i32) {
        let program = Program { instructions };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(program, InputSource::stdin(), &mut out, err).unwrap();
        let code = interp.run().unwrap();
        (String::from_utf8(out).unwrap(), code)
    }

    #[test]
    fn hello_world() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "s")]),
            inst(2, "MOVE", vec![var("GF", "s"), Argument::Str("Hello, World!".to_string())]),
            inst(3, "WRITE", vec![var("GF", "s")]),
            inst(4, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "Hello, World!");
        assert_eq!(code, 0);
    }

    #[test]
    fn arithmetic_and_jumps() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "i")]),
            inst(2, "MOVE", vec![var("GF", "i"), Argument::Int(0)]),
            inst(3, "LABEL", vec![Argument::Label("loop".into())]),
            inst(4, "ADD", vec![var("GF", "i"), var("GF", "i"), Argument::Int(1)]),
            inst(5, "WRITE", vec![var("GF", "i")]),
            inst(6, "JUMPIFNEQ", vec![Argument::Label("end".into()), var("GF", "i"), Argument::Int(3)]),
            inst(7, "JUMP", vec![Argument::Label("done".into())]),
            inst(8, "LABEL", vec![Argument::Label("end".into())]),
            inst(9, "LABEL", vec![Argument::Label("done".into())]),
            inst(10, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "123");
        assert_eq!(code, 0);
    }

    #[test]
    fn frames() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "x")]),
            inst(2, "MOVE", vec![var("GF", "x"), Argument::Int(1)]),
            inst(3, "CREATEFRAME", vec![]),
            inst(4, "DEFVAR", vec![var("TF", "x")]),
            inst(5, "MOVE", vec![var("TF", "x"), Argument::Int(2)]),
            inst(6, "PUSHFRAME", vec![]),
            inst(7, "WRITE", vec![var("LF", "x")]),
            inst(8, "POPFRAME", vec![]),
            inst(9, "WRITE", vec![var("TF", "x")]),
            inst(10, "WRITE", vec![var("GF", "x")]),
            inst(11, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "221");
        assert_eq!(code, 0);
    }

    #[test]
    fn call_and_return() {
        let program = vec![
            inst(1, "JUMP", vec![Argument::Label("main".into())]),
            inst(2, "LABEL", vec![Argument::Label("sub".into())]),
            inst(3, "WRITE", vec![Argument::Str("B".into())]),
            inst(4, "RETURN", vec![]),
            inst(5, "LABEL", vec![Argument::Label("main".into())]),
            inst(6, "WRITE", vec![Argument::Str("A".into())]),
            inst(7, "CALL", vec![Argument::Label("sub".into())]),
            inst(8, "WRITE", vec![Argument::Str("C".into())]),
            inst(9, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "ABC");
        assert_eq!(code, 0);
    }

    #[test]
    fn division_by_zero_halts_with_57() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "r")]),
            inst(2, "IDIV", vec![var("GF", "r"), Argument::Int(1), Argument::Int(0)]),
        ];
        let instructions = program;
        let prog = Program { instructions };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(prog, InputSource::stdin(), &mut out, err).unwrap();
        let result = interp.run();
        assert_eq!(result.unwrap_err().exit_code(), 57);
        assert!(out.is_empty());
    }

    #[test]
    fn string_round_trip() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "c")]),
            inst(2, "DEFVAR", vec![var("GF", "n")]),
            inst(3, "INT2CHAR", vec![var("GF", "c"), Argument::Int(65)]),
            inst(4, "STRI2INT", vec![var("GF", "n"), var("GF", "c"), Argument::Int(0)]),
            inst(5, "WRITE", vec![var("GF", "n")]),
            inst(6, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "65");
        assert_eq!(code, 0);
    }

    #[test]
    fn type_never_fails_on_undefined() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "x")]),
            inst(2, "DEFVAR", vec![var("GF", "t")]),
            inst(3, "TYPE", vec![var("GF", "t"), var("GF", "x")]),
            inst(4, "WRITE", vec![var("GF", "t")]),
            inst(5, "EXIT", vec![Argument::Int(0)]),
        ];
        let (stdout, code) = run(program);
        assert_eq!(stdout, "");
        assert_eq!(code, 0);
    }

    #[test]
    fn exit_code_out_of_range_fails_57() {
        let program = vec![inst(1, "EXIT", vec![Argument::Int(50)])];
        let prog = Program { instructions: program };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(prog, InputSource::stdin(), &mut out, err).unwrap();
        assert_eq!(interp.run().unwrap_err().exit_code(), 57);
    }

    #[test]
    fn unknown_opcode_fails_32() {
        let program = vec![inst(1, "NOTANOPCODE", vec![])];
        let prog = Program { instructions: program };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(prog, InputSource::stdin(), &mut out, err).unwrap();
        assert_eq!(interp.run().unwrap_err().exit_code(), 32);
    }

    #[test]
    fn move_of_undefined_fails_56() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "b")]),
            inst(3, "MOVE", vec![var("GF", "b"), var("GF", "a")]),
        ];
        let prog = Program { instructions: program };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(prog, InputSource::stdin(), &mut out, err).unwrap();
        assert_eq!(interp.run().unwrap_err().exit_code(), 56);
    }

    fn run_expect_err(instructions: Vec<Instruction>) -> i32 {
        let prog = Program { instructions };
        let mut out = Vec::new();
        let err = Vec::new();
        let mut interp = Interpreter::new(prog, InputSource::stdin(), &mut out, err).unwrap();
        interp.run().unwrap_err().exit_code()
    }

    #[test]
    fn undefined_operand_in_arithmetic_fails_56_not_53() {
        // GF@a is declared but never assigned: an undefined operand must be
        // reported as "missing value" (56), not "wrong type" (53).
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "ADD", vec![var("GF", "x"), var("GF", "a"), Argument::Int(1)]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_logical_op_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "AND", vec![var("GF", "x"), var("GF", "a"), Argument::Bool(true)]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_not_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "NOT", vec![var("GF", "x"), var("GF", "a")]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_concat_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "CONCAT", vec![var("GF", "x"), var("GF", "a"), Argument::Str("z".into())]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_int2char_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "INT2CHAR", vec![var("GF", "x"), var("GF", "a")]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_stri2int_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "STRI2INT", vec![var("GF", "x"), var("GF", "a"), Argument::Int(0)]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_getchar_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "GETCHAR", vec![var("GF", "x"), var("GF", "a"), Argument::Int(0)]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_strlen_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "STRLEN", vec![var("GF", "x"), var("GF", "a")]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn undefined_operand_in_setchar_fails_56_not_53() {
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "DEFVAR", vec![var("GF", "x")]),
            inst(3, "MOVE", vec![var("GF", "x"), Argument::Str("hello".into())]),
            inst(4, "SETCHAR", vec![var("GF", "x"), var("GF", "a"), Argument::Str("J".into())]),
        ];
        assert_eq!(run_expect_err(program), 56);
    }

    #[test]
    fn missing_target_frame_outranks_undefined_operand_in_move() {
        // TF was never created, so the target frame is missing (55). The
        // source operand (GF@a, declared but unassigned) would separately
        // fail 56, but spec.md §7 puts 55 ahead of 56: the target's
        // frame/name existence is checked before any operand is resolved.
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "MOVE", vec![var("TF", "x"), var("GF", "a")]),
        ];
        assert_eq!(run_expect_err(program), 55);
    }

    #[test]
    fn missing_target_frame_outranks_wrong_type_operand_in_arithmetic() {
        // TF was never created (55) and the operand is a string, not an int
        // (which alone would be 53). The target's frame check wins.
        let program = vec![inst(1, "ADD", vec![var("TF", "x"), Argument::Str("nope".into()), Argument::Int(1)])];
        assert_eq!(run_expect_err(program), 55);
    }

    #[test]
    fn undefined_target_name_outranks_undefined_operand() {
        // GF@x was never DEFVAR'd (54, name missing in an existing frame).
        // GF@a is declared but unassigned (56). Target check wins.
        let program = vec![
            inst(1, "DEFVAR", vec![var("GF", "a")]),
            inst(2, "MOVE", vec![var("GF", "x"), var("GF", "a")]),
        ];
        assert_eq!(run_expect_err(program), 54);
    }

    #[test]
    fn pops_missing_target_frame_outranks_empty_data_stack() {
        // POPS's target frame (LF) does not exist; the data stack is also
        // empty, which alone would be 56. The missing frame (55) wins
        // because the target is validated before the stack is touched.
        let program = vec![inst(1, "POPS", vec![var("LF", "x")])];
        assert_eq!(run_expect_err(program), 55);
    }
}
