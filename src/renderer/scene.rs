//! Scene generation from engine snapshots

use glam::Vec2;

use super::DrawCommand;
use crate::sim::{ReflexSnapshot, ScrollerSnapshot, TargetState};

const SKY_COLOR: &str = "#cfe9ff";
const PIPE_COLOR: &str = "#2e7d32";
const BIRD_COLOR: &str = "#ffeb3b";
const BIRD_OUTLINE: &str = "#111";
const BIRD_OUTLINE_WIDTH: f32 = 2.0;

const TARGET_COLOR: &str = "#fff";
const TARGET_HIT_COLOR: &str = "#66BB6A";

/// Reflex playfield: theme background, then targets oldest first so the
/// newest is drawn on top (matching the click hit-test order)
pub fn reflex_scene(snap: &ReflexSnapshot<'_>) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(snap.targets.len() + 1);
    commands.push(DrawCommand::Clear {
        color: snap.theme_color,
    });

    for target in snap.targets {
        let color = match target.state {
            TargetState::Active => TARGET_COLOR,
            TargetState::Hit => TARGET_HIT_COLOR,
            TargetState::Expired => continue,
        };
        commands.push(DrawCommand::FillCircle {
            center: target.center(),
            radius: target.size / 2.0,
            color,
        });
    }
    commands
}

/// Side-scroller: sky, pipe pairs, outlined bird
pub fn scroller_scene(snap: &ScrollerSnapshot<'_>) -> Vec<DrawCommand> {
    let view = snap.viewport;
    let mut commands = Vec::with_capacity(snap.obstacles.len() * 2 + 3);
    commands.push(DrawCommand::Clear { color: SKY_COLOR });

    for obstacle in snap.obstacles {
        commands.push(DrawCommand::FillRect {
            pos: Vec2::new(obstacle.x, 0.0),
            size: Vec2::new(obstacle.width, obstacle.gap_top),
            color: PIPE_COLOR,
        });
        let bottom_y = obstacle.gap_bottom();
        commands.push(DrawCommand::FillRect {
            pos: Vec2::new(obstacle.x, bottom_y),
            size: Vec2::new(obstacle.width, view.height - bottom_y),
            color: PIPE_COLOR,
        });
    }

    let bird = snap.bird;
    commands.push(DrawCommand::FillCircle {
        center: bird.pos,
        radius: bird.radius,
        color: BIRD_COLOR,
    });
    commands.push(DrawCommand::StrokeCircle {
        center: bird.pos,
        radius: bird.radius,
        color: BIRD_OUTLINE,
        line_width: BIRD_OUTLINE_WIDTH,
    });
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::ScoreRecorder;
    use crate::sim::{ReflexEngine, ScrollerEngine};

    #[test]
    fn test_reflex_scene_uses_theme() {
        let mut game = ReflexEngine::new(ScoreRecorder::guest(), 1);
        game.start("hard", 0.0);
        let commands = reflex_scene(&game.snapshot());
        assert_eq!(commands[0], DrawCommand::Clear { color: "#F44336" });
        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[1],
            DrawCommand::FillCircle { radius, color: TARGET_COLOR, .. } if radius == 20.0
        ));
    }

    #[test]
    fn test_scroller_scene_layers() {
        let mut game = ScrollerEngine::new(ScoreRecorder::guest(), 800.0, 600.0, 1);
        game.start(0.0);
        let snap = game.snapshot();
        let commands = scroller_scene(&snap);

        // Sky, two pipe halves, bird fill, bird outline
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], DrawCommand::Clear { color: SKY_COLOR });
        let DrawCommand::FillRect { pos, size, .. } = commands[2] else {
            panic!("expected the lower pipe");
        };
        assert_eq!(pos.y + size.y, 600.0);
        assert!(matches!(commands[4], DrawCommand::StrokeCircle { line_width, .. } if line_width == 2.0));
    }
}
