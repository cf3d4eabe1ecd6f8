use crate::ConfigStore;
use crate::error::Error;
use crate::layout::MAX_WAYPOINT_NUMBER;
use crate::platform::{Alarm, Platform};
use crate::records::Waypoint;
use crate::RecordKind;

impl<T: Platform, A: Alarm> ConfigStore<T, A> {
    /// Number of waypoint slots between the GPS config and the usage log.
    pub fn max_waypoint_capacity(&self) -> u8 {
        self.layout.max_waypoint_capacity()
    }

    /// Writes `waypoint` into the slot given by its own sequence number.
    ///
    /// Numbers above 254 or beyond [`ConfigStore::max_waypoint_capacity`] are
    /// rejected before anything is written, so a mission can never spill into
    /// the usage log or the reserved tail.
    pub fn store_waypoint(&mut self, waypoint: &Waypoint) -> Result<(), Error> {
        self.check_waypoint_number(waypoint.number)?;
        let offset = self.layout.waypoint_offset(waypoint.number);
        self.eeprom.write_record(offset, waypoint)
    }

    /// Reads waypoint `number`. Out of range numbers fail without touching the
    /// storage. A corrupt slot yields `ChecksumMismatch`; there are no default
    /// waypoints, the caller has to cope with the gap.
    ///
    /// The last successfully recalled waypoint stays available through
    /// [`ConfigStore::last_waypoint`] and is not affected by failures.
    pub fn recall_waypoint(&mut self, number: u8) -> Result<Waypoint, Error> {
        self.check_waypoint_number(number)?;
        let offset = self.layout.waypoint_offset(number);
        match self.eeprom.read_record::<Waypoint>(offset)? {
            Some(waypoint) => {
                self.waypoint = Some(waypoint.clone());
                Ok(waypoint)
            }
            None => Err(Error::ChecksumMismatch(RecordKind::Waypoint)),
        }
    }

    fn check_waypoint_number(&self, number: u8) -> Result<(), Error> {
        if number > MAX_WAYPOINT_NUMBER || number >= self.layout.max_waypoint_capacity() {
            return Err(Error::WaypointOutOfRange(number));
        }
        Ok(())
    }
}
