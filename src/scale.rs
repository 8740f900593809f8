use crate::time_filter::TimeFilter;

const UNFILTERED_RADIUS_RANGE: (f64, f64) = (0.0, 25.0);
const FILTERED_RADIUS_RANGE: (f64, f64) = (3.0, 50.0);

/// Square root scale so that marker area grows linearly with traffic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    max_traffic: f64,
    min_radius: f64,
    max_radius: f64,
}

impl RadiusScale {
    pub fn new(max_traffic: u32, (min_radius, max_radius): (f64, f64)) -> Self {
        RadiusScale {
            max_traffic: max_traffic.max(1) as f64,
            min_radius,
            max_radius,
        }
    }

    /// Filtered views hold far fewer trips, so they get a larger range with a
    /// visible minimum.
    pub fn for_filter(filter: TimeFilter, max_traffic: u32) -> Self {
        let range = match filter {
            TimeFilter::Any => UNFILTERED_RADIUS_RANGE,
            TimeFilter::Minute(_) => FILTERED_RADIUS_RANGE,
        };
        RadiusScale::new(max_traffic, range)
    }

    pub fn radius(&self, traffic: u32) -> f64 {
        let t = (traffic as f64 / self.max_traffic).sqrt();
        self.min_radius + t * (self.max_radius - self.min_radius)
    }
}
