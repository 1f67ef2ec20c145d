//! Character clip lookup and playback.
//!
//! Clips are matched to roles by case-insensitive substring against a
//! [`ClipMapping`]. When a name does not match, [`FallbackPolicy::Positional`]
//! takes the clip at the role's default index and reports it; `Strict` refuses.

use bevy::animation::RepeatAnimation;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::time::Duration;
use thiserror::Error;

use crate::collision::PlayerHit;
use crate::components::Player;
use crate::player::{Jumped, Landed};

const TRANSITION: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationRole {
    Run,
    Jump,
    Death,
    Idle,
}

impl AnimationRole {
    pub const ALL: [AnimationRole; 4] = [
        AnimationRole::Run,
        AnimationRole::Jump,
        AnimationRole::Death,
        AnimationRole::Idle,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Index tried when no clip name matches.
    pub fn default_index(self) -> usize {
        self.slot()
    }

    pub fn required(self) -> bool {
        self == AnimationRole::Run
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    Positional,
    Strict,
}

/// Name fragments identifying each role.
#[derive(Resource, Clone, Debug)]
pub struct ClipMapping {
    pub patterns: [&'static str; 4],
    pub fallback: FallbackPolicy,
}

impl Default for ClipMapping {
    fn default() -> Self {
        Self {
            patterns: ["run", "jump", "death", "idle"],
            fallback: FallbackPolicy::Positional,
        }
    }
}

impl ClipMapping {
    pub fn pattern(&self, role: AnimationRole) -> &'static str {
        self.patterns[role.slot()]
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClipError {
    #[error("model has no animation clips")]
    NoClips,
    #[error("no clip matches the {0:?} role")]
    Unmapped(AnimationRole),
}

/// Clip index per role, plus the roles that came from the positional fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipResolution {
    indices: [Option<usize>; 4],
    pub fallbacks: Vec<AnimationRole>,
}

impl ClipResolution {
    pub fn index(&self, role: AnimationRole) -> Option<usize> {
        self.indices[role.slot()]
    }
}

/// `names[i]` is the name of clip `i`, if it has one.
pub fn resolve_clips(names: &[Option<&str>], mapping: &ClipMapping) -> Result<ClipResolution, ClipError> {
    if names.is_empty() {
        return Err(ClipError::NoClips);
    }
    let mut resolution = ClipResolution::default();
    for role in AnimationRole::ALL {
        let pattern = mapping.pattern(role).to_lowercase();
        let matched = names.iter().position(|name| {
            name.map_or(false, |name| name.to_lowercase().contains(&pattern))
        });
        let index = match (matched, mapping.fallback) {
            (Some(index), _) => Some(index),
            (None, FallbackPolicy::Positional) if role.default_index() < names.len() => {
                resolution.fallbacks.push(role);
                Some(role.default_index())
            }
            (None, FallbackPolicy::Strict) if role.required() => {
                return Err(ClipError::Unmapped(role));
            }
            (None, _) => None,
        };
        resolution.indices[role.slot()] = index;
    }
    if resolution.index(AnimationRole::Run).is_none() {
        return Err(ClipError::Unmapped(AnimationRole::Run));
    }
    Ok(resolution)
}

/// Clip handles for the player model, resolved once the glTF is loaded.
#[derive(Resource, Default)]
pub struct CharacterClips {
    clips: [Option<Handle<AnimationClip>>; 4],
}

impl CharacterClips {
    pub fn from_gltf(gltf: &Gltf, mapping: &ClipMapping) -> Result<Self, ClipError> {
        let names: Vec<Option<&str>> = gltf
            .animations
            .iter()
            .map(|handle| {
                gltf.named_animations
                    .iter()
                    .find(|(_, named)| *named == handle)
                    .map(|(name, _)| name.as_str())
            })
            .collect();
        let resolution = resolve_clips(&names, mapping)?;
        for role in &resolution.fallbacks {
            warn!(
                "no clip named like {:?} for {role:?}, using clip #{}",
                mapping.pattern(*role),
                role.default_index()
            );
        }
        let mut clips = CharacterClips::default();
        for role in AnimationRole::ALL {
            clips.clips[role.slot()] = resolution
                .index(role)
                .map(|index| gltf.animations[index].clone());
        }
        Ok(clips)
    }

    pub fn get(&self, role: AnimationRole) -> Option<&Handle<AnimationClip>> {
        self.clips[role.slot()].as_ref()
    }
}

/// Links the player entity to the animation player inside its model.
#[derive(Component, Clone, Copy)]
pub struct CharacterAnimator(pub Entity);

/// Finds animation players spawned under the player scene.
pub fn attach_animators(
    mut commands: Commands,
    added: Query<Entity, Added<AnimationPlayer>>,
    parents: Query<&Parent>,
    players: Query<(), With<Player>>,
) {
    for entity in &added {
        let owner = parents
            .iter_ancestors(entity)
            .find(|ancestor| players.contains(*ancestor));
        if let Some(owner) = owner {
            commands.entity(owner).insert(CharacterAnimator(entity));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Restart the role from its first frame and loop it.
    Restart(AnimationRole),
    /// Blend into the role and loop it.
    Loop(AnimationRole),
    /// Blend into the role and play it once.
    Once(AnimationRole),
    /// Stop everything and play the role once.
    Final(AnimationRole),
}

pub fn play_cue(animation: &mut AnimationPlayer, clips: &CharacterClips, cue: Cue) {
    let (Cue::Restart(role) | Cue::Loop(role) | Cue::Once(role) | Cue::Final(role)) = cue;
    let Some(clip) = clips.get(role) else {
        return;
    };
    match cue {
        Cue::Restart(_) => {
            animation.resume();
            animation.start(clip.clone_weak()).repeat();
            animation.seek_to(0.0);
        }
        Cue::Loop(_) => {
            animation.play_with_transition(clip.clone_weak(), TRANSITION).repeat();
        }
        Cue::Once(_) => {
            animation
                .play_with_transition(clip.clone_weak(), TRANSITION)
                .set_repeat(RepeatAnimation::Never);
        }
        Cue::Final(_) => {
            // start() drops any blend in progress, so nothing else keeps playing
            animation.start(clip.clone_weak()).set_repeat(RepeatAnimation::Never);
        }
    }
}

#[derive(Event, Clone, Copy, Debug)]
pub struct AnimationReset;

/// Idle once the character appears, before the first run.
pub fn idle_new_animators(
    clips: Option<Res<CharacterClips>>,
    animators: Query<&CharacterAnimator, Added<CharacterAnimator>>,
    mut players: Query<&mut AnimationPlayer>,
) {
    let Some(clips) = clips else { return };
    for animator in &animators {
        if let Ok(mut animation) = players.get_mut(animator.0) {
            play_cue(&mut animation, &clips, Cue::Loop(AnimationRole::Idle));
        }
    }
}

/// Death beats landing beats take-off beats a reset.
pub fn pick_cue(reset: bool, jumped: bool, landed: bool, hit: bool) -> Option<Cue> {
    if hit {
        Some(Cue::Final(AnimationRole::Death))
    } else if landed {
        Some(Cue::Loop(AnimationRole::Run))
    } else if jumped {
        Some(Cue::Once(AnimationRole::Jump))
    } else if reset {
        Some(Cue::Restart(AnimationRole::Run))
    } else {
        None
    }
}

pub fn drive_character_animation(
    clips: Option<Res<CharacterClips>>,
    animators: Query<&CharacterAnimator>,
    mut players: Query<&mut AnimationPlayer>,
    mut resets: EventReader<AnimationReset>,
    mut jumps: EventReader<Jumped>,
    mut landings: EventReader<Landed>,
    mut hits: EventReader<PlayerHit>,
) {
    let Some(clips) = clips else {
        resets.clear();
        jumps.clear();
        landings.clear();
        hits.clear();
        return;
    };
    let cue = pick_cue(
        resets.read().count() > 0,
        jumps.read().count() > 0,
        landings.read().count() > 0,
        hits.read().count() > 0,
    );
    let Some(cue) = cue else { return };
    for animator in &animators {
        if let Ok(mut animation) = players.get_mut(animator.0) {
            play_cue(&mut animation, &clips, cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn death_wins_over_every_other_cue() {
        for bits in 0..8u8 {
            let (reset, jumped, landed) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            assert_eq!(
                pick_cue(reset, jumped, landed, true),
                Some(Cue::Final(AnimationRole::Death))
            );
        }
    }

    #[test]
    fn reset_restarts_the_run_clip() {
        assert_eq!(pick_cue(true, false, false, false), Some(Cue::Restart(AnimationRole::Run)));
        assert_eq!(pick_cue(false, false, false, false), None);
    }

    #[test]
    fn landing_in_the_jump_frame_goes_back_to_running() {
        assert_eq!(pick_cue(false, true, false, false), Some(Cue::Once(AnimationRole::Jump)));
        assert_eq!(pick_cue(true, true, true, false), Some(Cue::Loop(AnimationRole::Run)));
    }

    #[test]
    fn names_match_by_substring_regardless_of_case() {
        let names = [
            Some("Armature|Idle_Loop"),
            Some("Armature|RUNNING"),
            Some("Death_A"),
            Some("jump-start"),
        ];
        let resolution = resolve_clips(&names, &ClipMapping::default()).unwrap();
        assert_eq!(resolution.index(AnimationRole::Idle), Some(0));
        assert_eq!(resolution.index(AnimationRole::Run), Some(1));
        assert_eq!(resolution.index(AnimationRole::Death), Some(2));
        assert_eq!(resolution.index(AnimationRole::Jump), Some(3));
        assert!(resolution.fallbacks.is_empty());
    }

    #[test]
    fn unnamed_clips_fall_back_by_position_and_are_reported() {
        let names = [None, Some("Take 001"), None];
        let resolution = resolve_clips(&names, &ClipMapping::default()).unwrap();
        assert_eq!(resolution.index(AnimationRole::Run), Some(0));
        assert_eq!(resolution.index(AnimationRole::Jump), Some(1));
        assert_eq!(resolution.index(AnimationRole::Death), Some(2));
        assert_eq!(resolution.index(AnimationRole::Idle), None);
        assert_eq!(
            resolution.fallbacks,
            vec![AnimationRole::Run, AnimationRole::Jump, AnimationRole::Death]
        );
    }

    #[test]
    fn strict_policy_fails_loudly_on_a_missing_run_clip() {
        let mapping = ClipMapping {
            fallback: FallbackPolicy::Strict,
            ..default()
        };
        assert_eq!(
            resolve_clips(&[Some("Idle"), Some("Wave")], &mapping),
            Err(ClipError::Unmapped(AnimationRole::Run))
        );
        let resolution = resolve_clips(&[Some("run")], &mapping).unwrap();
        assert_eq!(resolution.index(AnimationRole::Death), None);
    }

    #[test]
    fn empty_clip_list_is_an_error() {
        assert_eq!(resolve_clips(&[], &ClipMapping::default()), Err(ClipError::NoClips));
    }

    #[test]
    fn custom_patterns_override_defaults() {
        let mapping = ClipMapping {
            patterns: ["sprint", "leap", "fall", "stand"],
            fallback: FallbackPolicy::Strict,
        };
        let resolution = resolve_clips(&[Some("Stand"), Some("Sprint"), Some("Leap")], &mapping).unwrap();
        assert_eq!(resolution.index(AnimationRole::Run), Some(1));
        assert_eq!(resolution.index(AnimationRole::Jump), Some(2));
        assert_eq!(resolution.index(AnimationRole::Idle), Some(0));
    }
}
