use crate::models::shipment::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres between two latitude/longitude pairs.
///
/// Inputs are not validated; out-of-range values give meaningless output.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + phi1.cos() * phi2.cos() * sin_lng * sin_lng;
    // rounding can push antipodal pairs just past 1.0; NaN passes through
    let central_angle = 2.0 * haversine.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    distance_km(a.lat, a.lng, b.lat, b.lng)
}

#[cfg(test)]
mod tests {
    use super::{distance_km, haversine_km};
    use crate::models::shipment::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 14.7886,
            lng: -16.9261,
        };
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (14.7167, -17.4677, 14.7886, -16.9261),
            (51.5074, -0.1278, 48.8566, 2.3522),
            (-33.8688, 151.2093, 40.7128, -74.0060),
        ];

        for (lat1, lng1, lat2, lng2) in pairs {
            let forward = distance_km(lat1, lng1, lat2, lng2);
            let backward = distance_km(lat2, lng2, lat1, lng1);
            assert!((forward - backward).abs() < 1e-9);
        }
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.56).abs() < 0.1);
    }

    #[test]
    fn dakar_to_thies_is_around_59_km() {
        let distance = distance_km(14.7167, -17.4677, 14.7886, -16.9261);
        assert!((distance - 58.78).abs() < 0.1);
    }

    #[test]
    fn one_degree_of_latitude_matches_sphere_arc() {
        let distance = distance_km(0.0, 0.0, 1.0, 0.0);
        let arc = std::f64::consts::PI * 6_371.0 / 180.0;
        assert!((distance - arc).abs() < 1e-6);
    }

    #[test]
    fn nan_input_yields_nan_distance() {
        assert!(distance_km(f64::NAN, f64::NAN, 14.0, -16.0).is_nan());
        assert!(distance_km(14.0, -16.0, 14.5, f64::NAN).is_nan());
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let distance = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * 6_371.0).abs() < 1e-6);
    }
}
