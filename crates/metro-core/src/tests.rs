#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::DVec2;

    use crate::commands::PlayerIntent;
    use crate::components::*;
    use crate::enums::*;
    use crate::error::MutationError;
    use crate::events::{GameEnded, GameEvent};
    use crate::types::*;

    #[test]
    fn test_segment_through_rect() {
        let water = Rect::new(720.0, 450.0, 50.0, 330.0);
        // Crosses the vertical strip horizontally.
        assert!(water.intersects_segment(DVec2::new(830.0, 750.0), DVec2::new(560.0, 700.0)));
        // Entirely to the left of it.
        assert!(!water.intersects_segment(DVec2::new(560.0, 700.0), DVec2::new(610.0, 480.0)));
    }

    #[test]
    fn test_segment_inside_rect() {
        let water = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(water.intersects_segment(DVec2::new(10.0, 10.0), DVec2::new(20.0, 20.0)));
    }

    #[test]
    fn test_segment_parallel_outside_rect() {
        let water = Rect::new(0.0, 1010.0, 380.0, 50.0);
        assert!(!water.intersects_segment(DVec2::new(0.0, 1000.0), DVec2::new(380.0, 1000.0)));
        assert!(water.intersects_segment(DVec2::new(0.0, 1030.0), DVec2::new(500.0, 1030.0)));
    }

    #[test]
    fn test_segment_missing_corner() {
        let water = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Diagonal passing just beyond the (10, 10) corner.
        assert!(!water.intersects_segment(DVec2::new(0.0, 21.0), DVec2::new(21.0, 0.0)));
        assert!(water.intersects_segment(DVec2::new(0.0, 19.0), DVec2::new(19.0, 0.0)));
    }

    #[test]
    fn test_rect_from_corners() {
        let r = Rect::from_corners(DVec2::new(380.0, 1060.0), DVec2::new(0.0, 1010.0));
        assert_eq!(r, Rect::new(0.0, 1010.0, 380.0, 50.0));
        assert!(r.contains(DVec2::new(100.0, 1020.0)));
        assert!(!r.contains(DVec2::new(100.0, 1000.0)));
    }

    #[test]
    fn test_effective_capacity_scales_with_upgrades() {
        let mut station = Station {
            id: StationId(0),
            station_type: StationType::Circle,
            capacity: 6,
            upgrade_level: 1,
            overcrowded_since: None,
        };
        assert_eq!(station.effective_capacity(), 6);
        station.upgrade_level = 3;
        assert_eq!(station.effective_capacity(), 18);
    }

    #[test]
    fn test_car_room() {
        let mut car = PassengerCar {
            capacity: 1,
            passengers: Vec::new(),
        };
        assert!(car.has_room());
        car.passengers.push(Passenger {
            wanted: StationType::Star,
            spawn_time: Duration::ZERO,
        });
        assert!(!car.has_room());
    }

    #[test]
    fn test_tunnel_is_undirected() {
        let tunnel = Tunnel {
            id: TunnelId(0),
            from: StationId(1),
            to: StationId(2),
        };
        assert!(tunnel.connects(StationId(2), StationId(1)));
        assert!(!tunnel.connects(StationId(1), StationId(3)));
    }

    #[test]
    fn test_inventory_counts() {
        let mut inv = Inventory {
            tunnels: 3,
            ..Default::default()
        };
        *inv.count_mut(ElementKind::Tunnel) -= 1;
        *inv.count_mut(ElementKind::Line) += 2;
        assert_eq!(inv.count(ElementKind::Tunnel), 2);
        assert_eq!(inv.lines, 2);
    }

    #[test]
    fn test_direction_reversed() {
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
        assert_eq!(Direction::Backward.reversed(), Direction::Forward);
    }

    #[test]
    fn test_player_intent_json_shape() {
        let intent = PlayerIntent::CreateLine {
            stations: vec![StationId(0), StationId(1)],
            shape: LineShape::Loop,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "CreateLine");
        assert_eq!(json["stations"], serde_json::json!([0, 1]));

        let back: PlayerIntent =
            serde_json::from_str(r#"{"type":"AssignTrain","line":4}"#).unwrap();
        assert!(matches!(back, PlayerIntent::AssignTrain { line: LineId(4) }));
    }

    #[test]
    fn test_game_ended_event_serde() {
        let event = GameEvent::GameEnded(GameEnded {
            reason: EndReason::Overcrowded {
                station: StationId(7),
            },
            at: Duration::from_secs(90),
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_mutation_error_messages() {
        let err = MutationError::CrossesWater {
            from: StationId(1),
            to: StationId(2),
        };
        assert_eq!(
            err.to_string(),
            "segment station #1 -> station #2 crosses water without a tunnel"
        );
        assert_eq!(
            MutationError::InsufficientResources(ElementKind::Train).to_string(),
            "no Train left"
        );
    }
}
