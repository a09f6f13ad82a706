use crate::core::units::HOURS_PER_DAY;

/// Whether the last period of a horizon feeds back into the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingClosure {
    Closed,
    Open,
}

/// An hourly horizon of whole days, indexed by a flat period index `day * 24 + hour`.
#[derive(Clone, Copy, Debug)]
pub struct SimulationTime {
    days: usize,
}

impl SimulationTime {
    pub fn new(days: usize) -> Self {
        Self { days }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn total_steps(&self) -> usize {
        self.days * HOURS_PER_DAY
    }

    pub fn iter(&self) -> impl Iterator<Item = SimulationTimeIteration> {
        (0..self.total_steps()).map(|index| SimulationTimeIteration { index })
    }

    /// Index of the period following `index`.
    ///
    /// Hour 23 always continues into hour 0 of the next day. The final period of the horizon
    /// only has a successor when the ring is closed.
    pub fn next_index(&self, index: usize, closure: RingClosure) -> Option<usize> {
        let total = self.total_steps();
        match (index + 1 < total, closure) {
            (true, _) => Some(index + 1),
            (false, RingClosure::Closed) => Some((index + 1) % total),
            (false, RingClosure::Open) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SimulationTimeIteration {
    pub index: usize,
}

impl SimulationTimeIteration {
    pub fn hour_of_day(&self) -> usize {
        self.index % HOURS_PER_DAY
    }

    pub fn current_day(&self) -> usize {
        self.index / HOURS_PER_DAY
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::*;

    #[fixture]
    pub fn simtime() -> SimulationTime {
        SimulationTime::new(3)
    }

    #[rstest]
    fn should_have_correct_total_steps(simtime: SimulationTime) {
        assert_eq!(simtime.total_steps(), 72)
    }

    #[rstest]
    fn should_iterate_correctly(simtime: SimulationTime) {
        let items: Vec<_> = simtime.iter().collect();
        assert_eq!(items.len(), 72);
        assert_eq!(items[23].hour_of_day(), 23);
        assert_eq!(items[23].current_day(), 0);
        assert_eq!(items[24].hour_of_day(), 0);
        assert_eq!(items[24].current_day(), 1);
        assert_eq!(items[71].current_day(), 2);
    }

    #[rstest]
    #[case(0, RingClosure::Open, Some(1))]
    #[case(23, RingClosure::Open, Some(24))]
    #[case(71, RingClosure::Open, None)]
    #[case(71, RingClosure::Closed, Some(0))]
    #[case(47, RingClosure::Closed, Some(48))]
    fn should_step_to_next_period(
        simtime: SimulationTime,
        #[case] index: usize,
        #[case] closure: RingClosure,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(simtime.next_index(index, closure), expected);
    }

    #[test]
    fn single_day_ring_wraps_to_its_own_start() {
        let simtime = SimulationTime::new(1);
        assert_eq!(simtime.next_index(23, RingClosure::Closed), Some(0));
    }
}
