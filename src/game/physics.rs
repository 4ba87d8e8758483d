//! Ball motion integration and collision resolution

use glam::Vec2;

use super::ball::Ball;
use super::table::Table;

/// Velocity retained per frame (not scaled by dt)
pub const FRICTION_FACTOR: f32 = 0.99;
/// Both velocity components below this snap the ball to rest (units/s)
pub const STOP_THRESHOLD: f32 = 5.0;
/// Degrees of visual spin per unit of |vx| + |vy|
pub const ROTATION_FACTOR: f32 = 0.1;
pub const RESTITUTION: f32 = 0.8;
/// Below this center distance two balls are treated as coincident
pub const DEGENERATE_DISTANCE: f32 = 1e-6;
const DEGENERATE_NUDGE: Vec2 = Vec2::new(0.01, 0.01);

/// Result of testing one ball pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Impulse exchanged along the contact normal
    Resolved { impulse: f32 },
    /// Overlapping but already moving apart
    Separating,
    /// Centers still coincide after the nudge
    Degenerate,
}

/// Physics system for the table
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one ball by `dt` and apply per-frame friction.
    /// Potted balls are left untouched.
    pub fn integrate(ball: &mut Ball, dt: f32, table: &Table) {
        if ball.is_potted {
            return;
        }

        ball.position += ball.velocity * dt;
        ball.velocity *= FRICTION_FACTOR;

        if ball.velocity.x.abs() < STOP_THRESHOLD && ball.velocity.y.abs() < STOP_THRESHOLD {
            ball.velocity = Vec2::ZERO;
            ball.is_moving = false;
        } else {
            ball.is_moving = true;
        }

        if ball.is_moving && !table.is_near_pocket(ball.position, ball.radius) {
            let speed = ball.velocity.x.abs() + ball.velocity.y.abs();
            ball.rotation = (ball.rotation + speed * ROTATION_FACTOR).rem_euclid(360.0);
        }
    }

    /// Reflect off the play rectangle. Balls inside the pocket zone pass
    /// through so they can drop instead of bouncing off the rail lip.
    /// Returns true if any rail was hit.
    pub fn bounce_rails(ball: &mut Ball, table: &Table) -> bool {
        if ball.is_potted || table.is_near_pocket(ball.position, ball.radius) {
            return false;
        }

        let r = ball.radius;
        let mut hit = false;

        if ball.position.x - r < table.left {
            ball.velocity.x = -ball.velocity.x;
            ball.position.x = table.left + r;
            hit = true;
        }
        if ball.position.x + r > table.right {
            ball.velocity.x = -ball.velocity.x;
            ball.position.x = table.right - r;
            hit = true;
        }
        if ball.position.y - r < table.top {
            ball.velocity.y = -ball.velocity.y;
            ball.position.y = table.top + r;
            hit = true;
        }
        if ball.position.y + r > table.bottom {
            ball.velocity.y = -ball.velocity.y;
            ball.position.y = table.bottom - r;
            hit = true;
        }

        hit
    }

    /// Check if two circles overlap
    pub fn check_collision(a: &Ball, b: &Ball) -> bool {
        a.position.distance(b.position) < a.radius + b.radius
    }

    /// Exchange an impulse between two overlapping balls of equal mass.
    /// `b` is the ball nudged when the centers coincide.
    pub fn resolve_collision(a: &mut Ball, b: &mut Ball) -> Contact {
        let mut delta = b.position - a.position;
        let mut distance = delta.length();

        if distance < DEGENERATE_DISTANCE {
            b.position += DEGENERATE_NUDGE;
            delta = b.position - a.position;
            distance = delta.length();
            if distance < DEGENERATE_DISTANCE {
                return Contact::Degenerate;
            }
        }

        let normal = delta / distance;
        let impact_speed = (b.velocity - a.velocity).dot(normal);

        if impact_speed > 0.0 {
            return Contact::Separating;
        }

        let impulse = -(1.0 + RESTITUTION) * impact_speed / 2.0;
        a.velocity -= normal * impulse;
        b.velocity += normal * impulse;

        Contact::Resolved { impulse }
    }

    /// Resolve every overlapping pair of active balls, pairwise and in index
    /// order: object ball i against each object ball j > i, then the cue
    /// against i. Expects the cue at index 0. Returns the number of
    /// impulses exchanged.
    pub fn resolve_ball_contacts(balls: &mut [Ball]) -> usize {
        let mut resolved = 0;
        let Some((cue, objects)) = balls.split_first_mut() else {
            return 0;
        };

        for i in 0..objects.len() {
            if objects[i].is_potted {
                continue;
            }

            for j in (i + 1)..objects.len() {
                let (head, tail) = objects.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                if b.is_potted || !Self::check_collision(a, b) {
                    continue;
                }
                if let Contact::Resolved { .. } = Self::resolve_collision(a, b) {
                    resolved += 1;
                }
            }

            if cue.is_active() && Self::check_collision(cue, &objects[i]) {
                if let Contact::Resolved { .. } = Self::resolve_collision(cue, &mut objects[i]) {
                    resolved += 1;
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ball::{rack, Ball};
    use crate::game::table::Difficulty;
    use crate::util::time::frame_delta;

    fn table() -> Table {
        Table::new(Difficulty::Medium)
    }

    fn ball_at(id: u8, x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        let mut ball = Ball::new(id, Vec2::new(x, y));
        ball.velocity = Vec2::new(vx, vy);
        ball
    }

    #[test]
    fn friction_brings_ball_to_rest() {
        let table = table();
        let mut ball = ball_at(1, 750.0, 325.0, 40.0, -30.0);

        // 0.99^n * 40 < 5 once n > ln(8) / -ln(0.99) ~ 207
        let mut frames = 0;
        while ball.velocity != Vec2::ZERO {
            PhysicsSystem::integrate(&mut ball, frame_delta(), &table);
            frames += 1;
            assert!(frames <= 210, "ball never settled");
        }
        assert!(!ball.is_moving);
        assert!(frames >= 200);
    }

    #[test]
    fn integrate_snaps_slow_ball_to_zero() {
        let table = table();
        let mut ball = ball_at(1, 750.0, 325.0, 4.0, -4.9);
        ball.is_moving = true;
        PhysicsSystem::integrate(&mut ball, frame_delta(), &table);
        assert_eq!(ball.velocity, Vec2::ZERO);
        assert!(!ball.is_moving);
    }

    #[test]
    fn integrate_moves_then_applies_friction() {
        let table = table();
        let mut ball = ball_at(1, 750.0, 325.0, 600.0, 0.0);
        PhysicsSystem::integrate(&mut ball, 0.5, &table);
        assert_eq!(ball.position, Vec2::new(1050.0, 325.0));
        assert!((ball.velocity.x - 594.0).abs() < 1e-3);
        assert!(ball.is_moving);
        assert!(ball.rotation > 0.0);
    }

    #[test]
    fn potted_ball_is_not_integrated() {
        let table = table();
        let mut ball = ball_at(2, 750.0, 325.0, 100.0, 0.0);
        ball.retire(crate::game::ball::POTTED_SENTINEL);
        PhysicsSystem::integrate(&mut ball, 1.0, &table);
        assert_eq!(ball.position, crate::game::ball::POTTED_SENTINEL);
    }

    #[test]
    fn head_on_collision_scales_relative_normal_speed() {
        let mut a = ball_at(1, 700.0, 325.0, 100.0, 30.0);
        let mut b = ball_at(2, 739.0, 325.0, -20.0, -10.0);
        let before = (b.velocity - a.velocity).x;

        let contact = PhysicsSystem::resolve_collision(&mut a, &mut b);
        assert!(matches!(contact, Contact::Resolved { .. }));

        let after = (b.velocity - a.velocity).x;
        assert!((after.abs() - RESTITUTION * before.abs()).abs() < 1e-3);
        assert!(after > 0.0, "balls should now separate");
        // Tangential components untouched
        assert_eq!(a.velocity.y, 30.0);
        assert_eq!(b.velocity.y, -10.0);
        // Equal masses: total momentum conserved
        let total = a.velocity + b.velocity;
        assert!((total - Vec2::new(80.0, 20.0)).length() < 1e-3);
    }

    #[test]
    fn separating_pair_is_left_alone() {
        let mut a = ball_at(1, 700.0, 325.0, -50.0, 0.0);
        let mut b = ball_at(2, 730.0, 325.0, 50.0, 0.0);
        let contact = PhysicsSystem::resolve_collision(&mut a, &mut b);
        assert_eq!(contact, Contact::Separating);
        assert_eq!(a.velocity.x, -50.0);
        assert_eq!(b.velocity.x, 50.0);
    }

    #[test]
    fn coincident_centers_are_nudged_apart() {
        let mut a = ball_at(1, 700.0, 325.0, 10.0, 10.0);
        let mut b = ball_at(2, 700.0, 325.0, 0.0, 0.0);
        let contact = PhysicsSystem::resolve_collision(&mut a, &mut b);
        assert!(b.position.distance(Vec2::new(700.01, 325.01)) < 1e-3);
        assert!(matches!(contact, Contact::Resolved { .. }));
        assert!(a.velocity.x.is_finite() && b.velocity.x.is_finite());
    }

    #[test]
    fn rail_reflects_and_clamps() {
        let table = table();
        let mut ball = ball_at(3, table.right - 5.0, 325.0, 200.0, 0.0);
        assert!(PhysicsSystem::bounce_rails(&mut ball, &table));
        assert_eq!(ball.velocity.x, -200.0);
        assert_eq!(ball.position.x, table.right - ball.radius);
    }

    #[test]
    fn rail_is_bypassed_near_pocket() {
        let table = table();
        let corner = table.pockets[2].center;
        let mut ball = ball_at(3, corner.x - 10.0, corner.y + 10.0, 200.0, -200.0);
        assert!(!PhysicsSystem::bounce_rails(&mut ball, &table));
        assert_eq!(ball.velocity, Vec2::new(200.0, -200.0));
    }

    #[test]
    fn cue_drives_lone_object_ball() {
        let table = table();
        let mut balls = rack(&table);
        // Cue driven straight into ball 1, which touches nothing else
        let target = balls[1].position;
        balls[0].position = target - Vec2::new(39.0, 0.0);
        balls[0].velocity = Vec2::new(500.0, 0.0);

        let resolved = PhysicsSystem::resolve_ball_contacts(&mut balls);
        assert_eq!(resolved, 1);
        assert!(balls[1].velocity.x > 0.0);
        assert!(balls[0].velocity.x < 500.0);
    }

    #[test]
    fn contacts_resolved_in_index_order() {
        // Three balls all overlapping one another
        let cue = ball_at(0, 700.0, 325.0, 300.0, 0.0);
        let one = ball_at(1, 735.0, 325.0, 0.0, 0.0);
        let two = ball_at(2, 717.5, 355.0, 0.0, -100.0);

        // Object pair first, then the cue against each object ball
        let (mut c, mut b1, mut b2) = (cue.clone(), one.clone(), two.clone());
        PhysicsSystem::resolve_collision(&mut b1, &mut b2);
        PhysicsSystem::resolve_collision(&mut c, &mut b1);
        PhysicsSystem::resolve_collision(&mut c, &mut b2);

        let mut balls = vec![cue.clone(), one.clone(), two.clone()];
        let resolved = PhysicsSystem::resolve_ball_contacts(&mut balls);
        assert_eq!(resolved, 3);
        assert_eq!(balls[0].velocity, c.velocity);
        assert_eq!(balls[1].velocity, b1.velocity);
        assert_eq!(balls[2].velocity, b2.velocity);

        // Cue-first ordering lands somewhere else
        let (mut c, mut b1, mut b2) = (cue, one, two);
        PhysicsSystem::resolve_collision(&mut c, &mut b1);
        PhysicsSystem::resolve_collision(&mut c, &mut b2);
        PhysicsSystem::resolve_collision(&mut b1, &mut b2);
        assert!(balls[0].velocity.distance(c.velocity) > 1.0);
        assert!(balls[1].velocity.distance(b1.velocity) > 1.0);
    }

    #[test]
    fn potted_balls_never_collide() {
        let table = table();
        let mut balls = rack(&table);
        balls[0].position = balls[1].position;
        balls[0].velocity = Vec2::new(300.0, 0.0);
        balls[1].retire(crate::game::ball::POTTED_SENTINEL);
        balls[1].position = balls[0].position;

        let resolved = PhysicsSystem::resolve_ball_contacts(&mut balls);
        assert_eq!(resolved, 0);
        assert_eq!(balls[0].velocity.x, 300.0);
    }
}
