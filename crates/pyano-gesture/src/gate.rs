/// Raise-then-lower debounce for one device.
///
/// The gate arms once the pitch deviation climbs above `arm_above` and
/// fires once, on the first update where the deviation has dropped below
/// `fire_below`. Holding the arm up never fires again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerGate {
    armed: bool,
    arm_above: i32,
    fire_below: i32,
}

impl TriggerGate {
    pub fn new(arm_above: i32, fire_below: i32) -> Self {
        Self {
            armed: false,
            arm_above,
            fire_below,
        }
    }

    /// Feed the current deviation; returns true when a strike should fire.
    pub fn update(&mut self, deviation: i32) -> bool {
        if deviation > self.arm_above {
            self.armed = true;
            false
        } else if self.armed && deviation < self.fire_below {
            self.armed = false;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }
}
