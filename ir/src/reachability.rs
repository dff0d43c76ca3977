//! Transitive operand-dependency queries.
//!
//! One dense bit matrix per computation snapshot: row `t` holds the set of
//! instructions whose output (transitively) flows into `t`, itself included.
//! Built in one post-order sweep, so each row is the union of its operands'
//! rows. The map describes the graph at build time; rebuild after mutating.

use std::collections::HashMap;

use crate::computation::Computation;
use crate::instruction::InstructionId;

pub struct ReachabilityMap {
    index_of: HashMap<InstructionId, usize>,
    bits: Vec<u64>,
    words_per_row: usize,
}

impl ReachabilityMap {
    pub fn build(computation: &Computation) -> Self {
        let order = computation.post_order();
        let count = order.len();
        let words_per_row = count.div_ceil(64).max(1);
        let index_of: HashMap<_, _> = order.iter().enumerate().map(|(index, &id)| (id, index)).collect();
        let mut map = Self { index_of, bits: vec![0; count * words_per_row], words_per_row };

        for &id in &order {
            let row = map.index_of[&id];
            map.set_bit(row, row);
            for &operand in computation.instruction(id).operands() {
                let src = map.index_of[&operand];
                map.or_row_into(src, row);
            }
        }
        map
    }

    /// Does data flow from `from` into `to`? Reflexive: an instruction
    /// reaches itself.
    pub fn is_reachable(&self, from: InstructionId, to: InstructionId) -> bool {
        let from = self.index_of[&from];
        let to = self.index_of[&to];
        self.bits[to * self.words_per_row + from / 64] >> (from % 64) & 1 == 1
    }

    fn set_bit(&mut self, row: usize, bit: usize) {
        self.bits[row * self.words_per_row + bit / 64] |= 1 << (bit % 64);
    }

    fn or_row_into(&mut self, src: usize, dst: usize) {
        for word in 0..self.words_per_row {
            let value = self.bits[src * self.words_per_row + word];
            self.bits[dst * self.words_per_row + word] |= value;
        }
    }
}
