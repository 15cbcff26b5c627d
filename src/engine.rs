use std::sync::Arc;
use std::sync::mpsc::Receiver;

use tracing::{debug, trace, warn};

use crate::assembler::{Assembler, DEFAULT_PROGRAM};
use crate::error::Result;
use crate::history::{History, HistoryEntry};
use crate::instruction::{Instruction, is_halt};
use crate::memory::{INP, MEMORY_SIZE, Memory, OUT, PC, PROGRAM_START, address};
use crate::observable::{Observable, Output};
use crate::program::ProgramData;
use crate::registers::recompute;

/// Result of [`Engine::run_with_inputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub steps: usize,
    /// Every value written to OUT, in order.
    pub outputs: Vec<i32>,
    pub halted: bool,
}

/// The MOV-only machine.
///
/// Owns the memory snapshot, the undo history and the observable state a
/// front end watches. Every mutation builds a fresh array and publishes it
/// whole. The engine is single-writer: callers on several threads must
/// serialize access themselves (for example behind a `Mutex<Engine>`).
pub struct Engine {
    memory: Observable<Memory>,
    read_pointer: Observable<Option<usize>>,
    write_pointer: Observable<Option<usize>>,
    program_counter: Observable<Option<usize>>,
    output: Observable<Output>,
    history_empty: Observable<bool>,
    program_reloads: Observable<u64>,
    history: History,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// A machine with cleared registers and the default program loaded.
    pub fn new() -> Self {
        let mut engine = Self {
            memory: Observable::new(Arc::new([0; MEMORY_SIZE])),
            read_pointer: Observable::new(None),
            write_pointer: Observable::new(None),
            program_counter: Observable::new(None),
            output: Observable::new(Output::Silent),
            history_empty: Observable::new(true),
            program_reloads: Observable::new(0),
            history: History::new(),
        };
        engine.reset_memory();
        engine.reset_program();
        engine
    }

    /// Execute the instruction at PC.
    ///
    /// Phases: decode, locate operands, record history, copy, then advance
    /// PC and recompute the derived registers. If the cell at PC is the
    /// halt sentinel nothing changes apart from clearing the pointers.
    pub fn step(&mut self) {
        let memory = self.memory.get();
        let pc = address(memory[PC]);
        let instr = memory[pc];
        if is_halt(instr) {
            self.clear_pointers();
            return;
        }

        let Instruction { src, dst } = Instruction::decode(instr);
        let pointers_before = (self.read_pointer.get(), self.write_pointer.get());
        self.read_pointer.publish(Some(src));
        self.write_pointer.publish(Some(dst));

        self.history.push(HistoryEntry {
            pc_before: memory[PC],
            instr,
            src,
            dst,
            value_src: memory[src],
            value_dst: memory[dst],
            pointers_before,
        });
        self.history_empty.publish(false);

        let value = memory[src];
        trace!(pc, instr, src, dst, value, "step");
        let mut next = *memory;
        next[dst] = value;
        if dst == OUT {
            self.output.publish(Output::Emitted(value));
        }

        next[PC] = next[PC].wrapping_add(1).rem_euclid(MEMORY_SIZE as i32);
        recompute(&mut next);
        self.memory.publish(Arc::new(next));
        self.refresh_pointers();
    }

    /// Undo the most recent step, pointers included. Returns false when
    /// there is nothing to undo.
    pub fn step_back(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        trace!(pc = entry.pc_before, dst = entry.dst, value = entry.value_dst, "step back");

        let mut next = *self.memory.get();
        next[PC] = entry.pc_before;
        next[entry.dst] = entry.value_dst;
        recompute(&mut next);
        self.memory.publish(Arc::new(next));
        self.history_empty.publish(self.history.is_empty());
        let (read, write) = entry.pointers_before;
        self.program_counter.publish(Some(address(entry.pc_before)));
        self.read_pointer.publish(read);
        self.write_pointer.publish(write);
        self.output.publish(Output::Silent);
        true
    }

    /// Step until the machine halts or `step_limit` steps have run.
    ///
    /// Returns the number of steps actually executed.
    pub fn run(&mut self, step_limit: usize) -> usize {
        let mut steps = 0;
        while steps < step_limit && !self.is_halted() {
            self.step();
            steps += 1;
        }
        steps
    }

    /// Like [`Engine::run`], acting as the host side of the INP port: before
    /// each step whose pending instruction reads INP, the next value from
    /// `inputs` is written there. Once the inputs run out INP keeps its
    /// last value.
    pub fn run_with_inputs(&mut self, inputs: &[i32], step_limit: usize) -> RunReport {
        let rx = self.output.subscribe();
        let mut inputs = inputs.iter().copied();
        let mut steps = 0;
        while steps < step_limit {
            let Some(instr) = self.next_instruction() else {
                break;
            };
            if instr.src == INP {
                match inputs.next() {
                    Some(v) => self.update_memory(INP, v),
                    None => warn!(step = steps, "input exhausted, INP keeps its value"),
                }
            }
            self.step();
            steps += 1;
        }
        // The first event is the value current at subscription time.
        let outputs = rx
            .try_iter()
            .skip(1)
            .filter_map(|event| match event {
                Output::Emitted(v) => Some(v),
                Output::Silent => None,
            })
            .collect();
        RunReport {
            steps,
            outputs,
            halted: self.is_halted(),
        }
    }

    /// Memory reset followed by clearing the history.
    pub fn reset(&mut self) {
        self.reset_memory();
        self.clear_history();
    }

    /// Zero cells 0-49 and point PC at the program start. The program
    /// region is untouched.
    pub fn reset_memory(&mut self) {
        debug!("memory reset");
        let mut next = *self.memory.get();
        clear_data_region(&mut next);
        self.memory.publish(Arc::new(next));
        self.publish_reset_state();
    }

    /// Zero cells 50-99 and assemble the default program into them.
    pub fn reset_program(&mut self) {
        debug!("program reset");
        let mut next = *self.memory.get();
        next[PROGRAM_START..].fill(0);
        next[PROGRAM_START..PROGRAM_START + DEFAULT_PROGRAM.len()]
            .copy_from_slice(&DEFAULT_PROGRAM);
        self.memory.publish(Arc::new(next));
        self.clear_history();
        self.clear_pointers();
        self.bump_program_reloads();
    }

    /// Write the assembled program from address 50 on. Cells past the end
    /// of the program keep their values.
    pub fn load(&mut self, program: &Assembler) -> Result<()> {
        let words = program.finish()?;
        let mut next = *self.memory.get();
        next[PROGRAM_START..PROGRAM_START + words.len()].copy_from_slice(&words);
        self.memory.publish(Arc::new(next));
        debug!(len = words.len(), "program loaded");
        self.clear_history();
        self.refresh_pointers();
        self.bump_program_reloads();
        Ok(())
    }

    /// Edit a single cell. Out-of-range addresses are ignored. Editing the
    /// program region invalidates the history.
    pub fn update_memory(&mut self, addr: usize, value: i32) {
        if addr >= MEMORY_SIZE {
            trace!(addr, "ignoring edit outside memory");
            return;
        }
        let mut next = *self.memory.get();
        next[addr] = value;
        recompute(&mut next);
        self.memory.publish(Arc::new(next));
        if addr >= PROGRAM_START {
            debug!(addr, "program edited, history invalidated");
            self.clear_history();
        }
        self.refresh_pointers();
    }

    /// Pack the program region. Fails if any cell is not a storable word.
    pub fn program_data(&self) -> Result<ProgramData> {
        ProgramData::from_cells(&self.memory.value()[PROGRAM_START..])
    }

    /// Replace the program region and perform a full reset, publishing a
    /// single snapshot.
    pub fn update_program_data(&mut self, data: &ProgramData) {
        debug!("loading program image");
        let mut next = *self.memory.get();
        next[PROGRAM_START..].copy_from_slice(&data.to_cells());
        clear_data_region(&mut next);
        self.memory.publish(Arc::new(next));
        self.publish_reset_state();
        self.clear_history();
        self.bump_program_reloads();
    }

    /// The instruction the next step would execute, or `None` at a halt.
    pub fn next_instruction(&self) -> Option<Instruction> {
        let memory = self.memory.value();
        let instr = memory[address(memory[PC])];
        (!is_halt(instr)).then(|| Instruction::decode(instr))
    }

    /// Halted-ness is derived from the cell at PC; it is never stored.
    pub fn is_halted(&self) -> bool {
        self.next_instruction().is_none()
    }

    pub fn memory(&self) -> Memory {
        self.memory.get()
    }

    pub fn read_pointer(&self) -> Option<usize> {
        self.read_pointer.get()
    }

    pub fn write_pointer(&self) -> Option<usize> {
        self.write_pointer.get()
    }

    pub fn program_counter(&self) -> Option<usize> {
        self.program_counter.get()
    }

    pub fn output(&self) -> Output {
        self.output.get()
    }

    pub fn is_history_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn program_reloads(&self) -> u64 {
        self.program_reloads.get()
    }

    pub fn subscribe_memory(&mut self) -> Receiver<Memory> {
        self.memory.subscribe()
    }

    pub fn subscribe_read_pointer(&mut self) -> Receiver<Option<usize>> {
        self.read_pointer.subscribe()
    }

    pub fn subscribe_write_pointer(&mut self) -> Receiver<Option<usize>> {
        self.write_pointer.subscribe()
    }

    pub fn subscribe_program_counter(&mut self) -> Receiver<Option<usize>> {
        self.program_counter.subscribe()
    }

    pub fn subscribe_output(&mut self) -> Receiver<Output> {
        self.output.subscribe()
    }

    pub fn subscribe_history_empty(&mut self) -> Receiver<bool> {
        self.history_empty.subscribe()
    }

    pub fn subscribe_program_reloads(&mut self) -> Receiver<u64> {
        self.program_reloads.subscribe()
    }

    /// Publish the pointers of the pending instruction, clearing both at a
    /// halt.
    fn refresh_pointers(&mut self) {
        let pc = address(self.memory.value()[PC]);
        let pending = self.next_instruction();
        self.program_counter.publish(Some(pc));
        self.read_pointer.publish(pending.map(|i| i.src));
        self.write_pointer.publish(pending.map(|i| i.dst));
    }

    /// Pointer and output state after a memory reset.
    fn publish_reset_state(&mut self) {
        self.program_counter.publish(Some(PROGRAM_START));
        self.clear_pointers();
        self.output.publish(Output::Silent);
    }

    fn clear_pointers(&mut self) {
        self.read_pointer.publish(None);
        self.write_pointer.publish(None);
    }

    fn clear_history(&mut self) {
        self.history.clear();
        self.history_empty.publish(true);
    }

    fn bump_program_reloads(&mut self) {
        let n = self.program_reloads.get();
        self.program_reloads.publish(n + 1);
    }
}

/// Zero cells 0-49 and point PC at the program start.
fn clear_data_region(memory: &mut [i32; MEMORY_SIZE]) {
    memory[..PROGRAM_START].fill(0);
    memory[PC] = PROGRAM_START as i32;
    recompute(memory);
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::history::HISTORY_CAPACITY;
    use crate::memory::{CMP, OP_A, OP_B, OP_C, SUB, SUM, TRN};
    use proptest::prelude::*;

    fn assert_derived(memory: &Memory) -> std::result::Result<(), TestCaseError> {
        let (a, b, c) = (memory[OP_A], memory[OP_B], memory[OP_C]);
        prop_assert_eq!(memory[SUM], (a + b).rem_euclid(10000));
        prop_assert_eq!(memory[SUB], (a - b).rem_euclid(10000));
        prop_assert_eq!(memory[CMP], i32::from(a > b));
        prop_assert_eq!(memory[TRN], if c != 0 { a } else { b });
        Ok(())
    }

    fn edits() -> impl Strategy<Value = Vec<(usize, i32)>> {
        prop::collection::vec((0usize..MEMORY_SIZE, 0i32..9999), 0..64)
    }

    proptest! {
        #[test]
        fn step_then_step_back_is_identity(edits in edits()) {
            let mut engine = Engine::new();
            for (addr, value) in edits {
                engine.update_memory(addr, value);
            }
            prop_assume!(!engine.is_halted());

            let memory = engine.memory();
            let pointers = (engine.read_pointer(), engine.write_pointer(), engine.program_counter());
            engine.step();
            prop_assert!(engine.step_back());
            prop_assert_eq!(engine.memory(), memory);
            prop_assert_eq!((engine.read_pointer(), engine.write_pointer(), engine.program_counter()), pointers);
        }

        #[test]
        fn derived_registers_hold_while_running(edits in edits(), steps in 0usize..300) {
            let mut engine = Engine::new();
            for (addr, value) in edits {
                engine.update_memory(addr, value);
                assert_derived(&engine.memory())?;
            }
            for _ in 0..steps {
                engine.step();
                assert_derived(&engine.memory())?;
            }
            while engine.step_back() {
                assert_derived(&engine.memory())?;
            }
        }

        #[test]
        fn pc_stays_in_range(edits in edits(), steps in 0usize..300) {
            let mut engine = Engine::new();
            for (addr, value) in edits {
                engine.update_memory(addr, value);
            }
            engine.run(steps);
            prop_assert!(engine.history_len() <= HISTORY_CAPACITY);
            prop_assert!(engine.program_counter().is_some_and(|pc| pc < MEMORY_SIZE));
        }
    }
}
