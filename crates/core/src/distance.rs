//! Great-circle distance ranking of search results.

use crate::constants::EARTH_RADIUS_KM;
use crate::LabSearchResult;
use lablink_types::GeoPoint;
use std::cmp::Ordering;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let d_lat = (to.latitude() - from.latitude()).to_radians();
    let d_lon = (to.longitude() - from.longitude()).to_radians();

    // Rounding can push `a` past 1 for near-antipodal points.
    let a = ((d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2))
        .min(1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Attaches `distance_km` to every located result and sorts ascending by it.
///
/// The sort is stable: equal distances keep their incoming order. Results without a location
/// have no distance and go after all located ones. With no `origin` (geolocation denied or
/// unavailable) the input is returned untouched.
pub fn rank_by_distance(
    mut results: Vec<LabSearchResult>,
    origin: Option<GeoPoint>,
) -> Vec<LabSearchResult> {
    let Some(origin) = origin else {
        return results;
    };

    for lab in &mut results {
        lab.distance_km = lab.location.map(|loc| haversine_km(origin, loc));
    }

    results.sort_by(|a, b| match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).expect("valid point")
    }

    fn lab_at(id: &str, location: Option<GeoPoint>) -> LabSearchResult {
        let mut lab = LabSearchResult::new(id, id);
        lab.location = location;
        lab
    }

    const LAGOS: (f64, f64) = (6.5244, 3.3792);
    const ABUJA: (f64, f64) = (9.0765, 7.3986);

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lng) in [LAGOS, ABUJA, (0.0, 0.0), (-33.9, 151.2), (89.9, -179.9)] {
            assert_eq!(haversine_km(point(lat, lng), point(lat, lng)), 0.0);
        }
    }

    #[test]
    fn antipodal_points_are_half_the_circumference_apart() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        for (a, b) in [((0.0, 0.0), (0.0, 180.0)), ((6.5244, 3.3792), (-6.5244, -176.6208))] {
            let d = haversine_km(point(a.0, a.1), point(b.0, b.1));
            assert!(d.is_finite());
            assert!((d - half).abs() < 0.01, "{d} != {half}");
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (LAGOS, ABUJA),
            ((0.0, 0.0), (0.0, 90.0)),
            ((51.5, -0.12), (-33.9, 151.2)),
        ];
        for (a, b) in pairs {
            let ab = haversine_km(point(a.0, a.1), point(b.0, b.1));
            let ba = haversine_km(point(b.0, b.1), point(a.0, a.1));
            assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
        }
    }

    #[test]
    fn lagos_to_abuja_is_about_526_km() {
        let d = haversine_km(point(LAGOS.0, LAGOS.1), point(ABUJA.0, ABUJA.1));
        assert!((d - 525.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn user_in_lagos_ranks_lagos_lab_first() {
        let labs = vec![
            lab_at("abuja", Some(point(ABUJA.0, ABUJA.1))),
            lab_at("lagos", Some(point(LAGOS.0, LAGOS.1))),
        ];

        let ranked = rank_by_distance(labs, Some(point(LAGOS.0, LAGOS.1)));

        assert_eq!(ranked[0].id, "lagos");
        assert!(ranked[0].distance_km.expect("distance") < 1e-6);
        assert_eq!(ranked[1].id, "abuja");
        assert!(ranked[1].distance_km.expect("distance") > 500.0);
    }

    #[test]
    fn equal_distances_keep_incoming_order() {
        let same = Some(point(6.6018, 3.3515));
        let labs = vec![
            lab_at("first", same),
            lab_at("far", Some(point(ABUJA.0, ABUJA.1))),
            lab_at("second", same),
            lab_at("third", same),
        ];

        let ranked = rank_by_distance(labs, Some(point(LAGOS.0, LAGOS.1)));
        let ids: Vec<&str> = ranked.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third", "far"]);
    }

    #[test]
    fn labs_without_location_go_last_in_incoming_order() {
        let labs = vec![
            lab_at("unknown-a", None),
            lab_at("abuja", Some(point(ABUJA.0, ABUJA.1))),
            lab_at("unknown-b", None),
            lab_at("lagos", Some(point(LAGOS.0, LAGOS.1))),
        ];

        let ranked = rank_by_distance(labs, Some(point(LAGOS.0, LAGOS.1)));
        let ids: Vec<&str> = ranked.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["lagos", "abuja", "unknown-a", "unknown-b"]);
        assert_eq!(ranked[2].distance_km, None);
    }

    #[test]
    fn no_origin_keeps_upstream_order() {
        let labs = vec![
            lab_at("abuja", Some(point(ABUJA.0, ABUJA.1))),
            lab_at("lagos", Some(point(LAGOS.0, LAGOS.1))),
        ];

        let ranked = rank_by_distance(labs.clone(), None);
        assert_eq!(ranked, labs);
    }

    #[test]
    fn lab_on_the_equator_is_still_ranked() {
        let labs = vec![
            lab_at("abuja", Some(point(ABUJA.0, ABUJA.1))),
            lab_at("null-island", Some(point(0.0, 0.0))),
        ];
        let ranked = rank_by_distance(labs, Some(point(1.0, 1.0)));
        assert_eq!(ranked[0].id, "null-island");
        assert!(ranked[0].distance_km.is_some());
    }
}
