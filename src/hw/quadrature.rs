// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder inputs on EXTI lines.
//!
//! Channel A sits on PA0 (EXTI0) and channel B on PA1 (EXTI1). Both lines trigger on rising and
//! falling edges; each handler clears its pending bit, samples both levels and feeds them to
//! [`QuadratureState::on_edge`].
//!
//! The NVIC lines stay masked until [`unmask`] is called, so the pins can be moved into the
//! handlers' shared slot first.

use stm32f7xx_hal::{
    gpio::{gpioa, Edge, ExtiPin, Floating, Input},
    pac::{self, Interrupt, EXTI, SYSCFG},
    rcc::APB2,
};

use crate::sensing::{QuadratureInputs, QuadratureState};

/// Encoder channel pins configured as EXTI sources.
pub struct QuadraturePins {
    a: gpioa::PA0<Input<Floating>>,
    b: gpioa::PA1<Input<Floating>>,
    exti: EXTI,
}

impl QuadraturePins {
    /// Route PA0/PA1 to their EXTI lines. Edge triggers are armed later by `start`.
    pub fn new(
        mut a: gpioa::PA0<Input<Floating>>,
        mut b: gpioa::PA1<Input<Floating>>,
        syscfg: &mut SYSCFG,
        apb: &mut APB2,
        exti: EXTI,
    ) -> Self {
        a.make_interrupt_source(syscfg, apb);
        b.make_interrupt_source(syscfg, apb);
        Self { a, b, exti }
    }

    /// Handler body for either line: acknowledge, sample, decode.
    #[inline]
    pub fn service(&mut self, state: &QuadratureState) {
        self.a.clear_interrupt_pending_bit();
        self.b.clear_interrupt_pending_bit();
        state.on_edge(self.a.is_high(), self.b.is_high());
    }
}

impl QuadratureInputs for QuadraturePins {
    fn levels(&mut self) -> (bool, bool) {
        (self.a.is_high(), self.b.is_high())
    }

    fn enable_edge_interrupts(&mut self) {
        self.a.trigger_on_edge(&mut self.exti, Edge::RisingFalling);
        self.b.trigger_on_edge(&mut self.exti, Edge::RisingFalling);
        self.a.enable_interrupt(&mut self.exti);
        self.b.enable_interrupt(&mut self.exti);
    }
}

/// Unmask both encoder lines in the NVIC.
///
/// # Safety
///
/// The EXTI0/EXTI1 handlers must be able to reach the `QuadraturePins` before this is called;
/// otherwise a pending edge cannot be acknowledged and the handler re-enters forever.
pub unsafe fn unmask() {
    pac::NVIC::unmask(Interrupt::EXTI0);
    pac::NVIC::unmask(Interrupt::EXTI1);
}
