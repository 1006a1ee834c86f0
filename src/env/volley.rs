use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{ActionFlags, Environment, StepInfo, StepOutcome};
use crate::error::EnvError;

pub const OBSERVATION_DIM: usize = 12;

const COURT_HALF_WIDTH: f64 = 24.0;
const NET_HALF_WIDTH: f64 = 0.5;
const NET_HEIGHT: f64 = 3.5;
const PLAYER_RADIUS: f64 = 1.5;
const BALL_RADIUS: f64 = 0.5;
const GRAVITY: f64 = -29.4;
const PLAYER_SPEED_X: f64 = 17.5;
const PLAYER_SPEED_Y: f64 = 13.5;
const MAX_BALL_SPEED: f64 = 22.5;
const WALL_FRICTION: f64 = 0.9;
const DT: f64 = 1.0 / 30.0;
const OBS_SCALE: f64 = 0.1;

/// Parameters of the bundled volleyball duel.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VolleyConfig {
    pub max_ticks: usize,
    pub lives: u32,
}

impl Default for VolleyConfig {
    fn default() -> Self {
        VolleyConfig {
            max_ticks: 3000,
            lives: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

impl Body {
    /// Write this body into `out` as seen by the side facing `dir`.
    fn observe(&self, dir: f64, out: &mut [f64]) {
        out[0] = self.x * dir * OBS_SCALE;
        out[1] = self.y * OBS_SCALE;
        out[2] = self.vx * dir * OBS_SCALE;
        out[3] = self.vy * OBS_SCALE;
    }
}

/// A player whose own half of the court lies in the `dir` direction.
#[derive(Debug, Clone, Copy)]
struct Player {
    body: Body,
    dir: f64,
}

impl Player {
    fn spawn(dir: f64) -> Self {
        Player {
            body: Body {
                x: dir * COURT_HALF_WIDTH / 2.0,
                ..Body::default()
            },
            dir,
        }
    }

    fn apply(&mut self, flags: ActionFlags) {
        // Forward points at the net, i.e. against the own-half direction.
        self.body.vx = match (flags.forward, flags.backward) {
            (true, false) => -self.dir * PLAYER_SPEED_X,
            (false, true) => self.dir * PLAYER_SPEED_X,
            _ => 0.0,
        };
        if flags.jump && self.body.y <= 0.0 {
            self.body.vy = PLAYER_SPEED_Y;
        }
    }

    fn integrate(&mut self) {
        let b = &mut self.body;
        if b.y > 0.0 || b.vy > 0.0 {
            b.vy += GRAVITY * DT;
        }
        b.x += b.vx * DT;
        b.y += b.vy * DT;
        if b.y <= 0.0 {
            b.y = 0.0;
            b.vy = 0.0;
        }
        let own = (b.x * self.dir).clamp(
            NET_HALF_WIDTH + PLAYER_RADIUS,
            COURT_HALF_WIDTH - PLAYER_RADIUS,
        );
        b.x = own * self.dir;
    }
}

/// Scripted baseline controller, reading an observation in its own frame.
///
/// Tracks the ball while it is on its half, returns home otherwise, and
/// jumps at a descending ball within reach.
pub fn baseline_action(obs: &[f64; OBSERVATION_DIM]) -> ActionFlags {
    let (x, ball_x, ball_y, ball_vy) = (obs[0], obs[4], obs[5], obs[7]);
    let home = COURT_HALF_WIDTH / 2.0 * OBS_SCALE;
    let target = if ball_x > 0.0 { ball_x + 0.05 } else { home };
    ActionFlags {
        forward: x > target + 0.05,
        backward: x < target - 0.05,
        jump: ball_x > 0.0 && (ball_x - x).abs() < 0.3 && ball_y < 0.45 && ball_vy < 0.0,
    }
}

/// Small deterministic 2-D volleyball duel. Side A plays on the right half.
pub struct VolleyEnv {
    config: VolleyConfig,
    right: Player,
    left: Player,
    ball: Body,
    lives_right: u32,
    lives_left: u32,
    ticks: usize,
    done: bool,
    rng: StdRng,
}

impl VolleyEnv {
    pub fn new(config: VolleyConfig) -> Self {
        let lives = config.lives;
        VolleyEnv {
            config,
            right: Player::spawn(1.0),
            left: Player::spawn(-1.0),
            ball: Body::default(),
            lives_right: lives,
            lives_left: lives,
            ticks: 0,
            done: true,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Remaining lives as `(side A, side B)`.
    pub fn lives(&self) -> (u32, u32) {
        (self.lives_right, self.lives_left)
    }

    fn serve(&mut self) {
        self.ball = Body {
            x: 0.0,
            y: 12.0,
            vx: self.rng.random_range(-20.0..20.0),
            vy: self.rng.random_range(10.0..25.0),
        };
    }

    fn observe(&self, side: &Player, other: &Player) -> [f64; OBSERVATION_DIM] {
        let mut obs = [0.0; OBSERVATION_DIM];
        side.body.observe(side.dir, &mut obs[0..4]);
        self.ball.observe(side.dir, &mut obs[4..8]);
        other.body.observe(side.dir, &mut obs[8..12]);
        obs
    }

    fn move_ball(&mut self) {
        let b = &mut self.ball;
        b.vy += GRAVITY * DT;
        b.x += b.vx * DT;
        b.y += b.vy * DT;

        let wall = COURT_HALF_WIDTH - BALL_RADIUS;
        if b.x.abs() > wall {
            b.x = wall * b.x.signum();
            b.vx = -b.vx * WALL_FRICTION;
        }

        let net = NET_HALF_WIDTH + BALL_RADIUS;
        if b.y < NET_HEIGHT + BALL_RADIUS && b.x.abs() < net {
            let came_from = if b.vx > 0.0 { -1.0 } else { 1.0 };
            b.x = net * came_from;
            b.vx = -b.vx * WALL_FRICTION;
        }

        for player in [self.right, self.left] {
            let dx = b.x - player.body.x;
            let dy = b.y - player.body.y;
            let dist = (dx * dx + dy * dy).sqrt();
            let reach = PLAYER_RADIUS + BALL_RADIUS;
            if dist < reach && dist > 0.0 {
                let (nx, ny) = (dx / dist, dy / dist);
                b.x = player.body.x + nx * reach;
                b.y = player.body.y + ny * reach;
                let dot = b.vx * nx + b.vy * ny;
                b.vx = b.vx - 2.0 * dot * nx + player.body.vx;
                b.vy = b.vy - 2.0 * dot * ny + player.body.vy;
            }
        }

        let speed = (b.vx * b.vx + b.vy * b.vy).sqrt();
        if speed > MAX_BALL_SPEED {
            b.vx *= MAX_BALL_SPEED / speed;
            b.vy *= MAX_BALL_SPEED / speed;
        }
    }

    /// Score a grounded ball. Returns the reward from side A's view.
    fn score(&mut self) -> f64 {
        if self.ball.y > BALL_RADIUS {
            return 0.0;
        }
        let reward = if self.ball.x > 0.0 {
            self.lives_right = self.lives_right.saturating_sub(1);
            -1.0
        } else {
            self.lives_left = self.lives_left.saturating_sub(1);
            1.0
        };
        self.serve();
        reward
    }
}

impl Environment for VolleyEnv {
    fn observation_dim(&self) -> usize {
        OBSERVATION_DIM
    }

    fn reset(&mut self) -> Result<Vec<f64>, EnvError> {
        self.right = Player::spawn(1.0);
        self.left = Player::spawn(-1.0);
        self.lives_right = self.config.lives;
        self.lives_left = self.config.lives;
        self.ticks = 0;
        self.done = false;
        self.serve();
        Ok(self.observe(&self.right, &self.left).to_vec())
    }

    fn step(
        &mut self,
        action: ActionFlags,
        opponent: Option<ActionFlags>,
    ) -> Result<StepOutcome, EnvError> {
        if self.done {
            return Err(EnvError::EpisodeOver);
        }
        let opponent = opponent
            .unwrap_or_else(|| baseline_action(&self.observe(&self.left, &self.right)));

        self.right.apply(action);
        self.left.apply(opponent);
        self.right.integrate();
        self.left.integrate();
        self.move_ball();
        let reward = self.score();

        self.ticks += 1;
        self.done = self.lives_right == 0
            || self.lives_left == 0
            || self.ticks >= self.config.max_ticks;

        Ok(StepOutcome {
            observation: self.observe(&self.right, &self.left).to_vec(),
            reward,
            done: self.done,
            info: StepInfo {
                other_observation: Some(self.observe(&self.left, &self.right).to_vec()),
            },
        })
    }

    fn seed(&mut self, value: u64) {
        self.rng = StdRng::seed_from_u64(value);
    }
}
