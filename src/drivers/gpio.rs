//! ESP-IDF implementation of [`GpioPort`] over the raw `gpio_*` driver.
//!
//! Lines are reconfigured at runtime (buttons flip between input and
//! output on every press), so this goes straight to `gpio_set_direction`
//! instead of owning typed `PinDriver`s.

use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::{Edge, EdgeHandler, GpioPort, Level, LineId, PinMode};
use crate::error::GpioError;

use super::init_once::InitOnce;

/// Handler registered for one line.  Leaked on registration: interrupt
/// handlers live for the rest of the process.
struct IsrSlot {
    line: LineId,
    handler: EdgeHandler,
}

unsafe extern "C" fn isr_trampoline(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `IsrSlot` leaked in `set_edge_interrupt`; it is
    // never freed or mutated.
    let slot = unsafe { &*arg.cast::<IsrSlot>() };
    (slot.handler)(slot.line);
}

static ISR_SERVICE: InitOnce = InitOnce::new();

/// GPIO port backed by the ESP-IDF driver.
#[derive(Debug, Default)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }

    fn pin(line: LineId) -> Result<gpio_num_t, GpioError> {
        let pin = gpio_num_t::from(line.0);
        if pin >= gpio_num_t_GPIO_NUM_MAX {
            return Err(GpioError::InvalidLine(line));
        }
        Ok(pin)
    }

    fn install_isr_service(line: LineId) -> Result<(), GpioError> {
        let ret = ISR_SERVICE.call(|| {
            // SAFETY: plain driver call; ESP_ERR_INVALID_STATE means another
            // component installed it first, which is fine.
            let rc = unsafe { gpio_install_isr_service(0) };
            if rc == ESP_ERR_INVALID_STATE as i32 || rc == ESP_OK as i32 {
                info!("gpio: ISR service installed");
                return ESP_OK as i32;
            }
            rc
        });
        if ret != ESP_OK as i32 {
            return Err(GpioError::IsrInstallFailed { line, code: ret });
        }
        Ok(())
    }
}

impl GpioPort for EspGpio {
    fn enable(&self, line: LineId, mode: PinMode) -> Result<(), GpioError> {
        let pin = Self::pin(line)?;
        let mode = match mode {
            PinMode::Input => gpio_mode_t_GPIO_MODE_INPUT,
            PinMode::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
        };
        // SAFETY: pin range checked above.
        let ret = unsafe { gpio_set_direction(pin, mode) };
        if ret != ESP_OK as i32 {
            return Err(GpioError::ConfigFailed { line, code: ret });
        }
        // The fan board provides the pull-ups.
        // SAFETY: as above.
        let ret = unsafe { gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_FLOATING) };
        if ret != ESP_OK as i32 {
            return Err(GpioError::ConfigFailed { line, code: ret });
        }
        Ok(())
    }

    fn write(&self, line: LineId, level: Level) -> Result<(), GpioError> {
        let pin = Self::pin(line)?;
        let level = u32::from(level == Level::High);
        // SAFETY: pin range checked above.
        let ret = unsafe { gpio_set_level(pin, level) };
        if ret != ESP_OK as i32 {
            return Err(GpioError::WriteFailed { line, code: ret });
        }
        Ok(())
    }

    fn read(&self, line: LineId) -> Result<Level, GpioError> {
        let pin = Self::pin(line)?;
        // SAFETY: pin range checked above.
        let raw = unsafe { gpio_get_level(pin) };
        Ok(if raw == 0 { Level::Low } else { Level::High })
    }

    fn set_edge_interrupt(
        &self,
        line: LineId,
        edge: Edge,
        handler: EdgeHandler,
    ) -> Result<(), GpioError> {
        let pin = Self::pin(line)?;
        Self::install_isr_service(line)?;

        let intr = match edge {
            Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
            Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
            Edge::Any => gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let slot: &'static IsrSlot = Box::leak(Box::new(IsrSlot { line, handler }));

        // SAFETY: pin range checked; `slot` is 'static and only read by the
        // trampoline.
        unsafe {
            let ret = gpio_set_intr_type(pin, intr);
            if ret != ESP_OK as i32 {
                return Err(GpioError::IsrInstallFailed { line, code: ret });
            }
            let arg = core::ptr::from_ref(slot).cast_mut().cast();
            let ret = gpio_isr_handler_add(pin, Some(isr_trampoline), arg);
            if ret != ESP_OK as i32 {
                return Err(GpioError::IsrInstallFailed { line, code: ret });
            }
            let ret = gpio_intr_enable(pin);
            if ret != ESP_OK as i32 {
                return Err(GpioError::IsrInstallFailed { line, code: ret });
            }
        }
        info!("gpio: {:?} edge interrupt on {}", edge, line);
        Ok(())
    }
}
