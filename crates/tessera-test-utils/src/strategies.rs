//! Proptest strategies for features and array edit sequences.

use proptest::collection::vec;
use proptest::prelude::*;
use tessera_core::{FeatureType, GroupId, OwnedFeature};

/// Any of the known feature types.
pub fn arb_feature_type() -> impl Strategy<Value = FeatureType> {
    (FeatureType::NONE.0..=FeatureType::HULL.0).prop_map(FeatureType)
}

/// Null or one of a handful of groups.
pub fn arb_group_id() -> impl Strategy<Value = GroupId> {
    prop_oneof![Just(GroupId::NULL), (0u32..4).prop_map(GroupId)]
}

/// A feature of up to `max_points` integer points.
pub fn arb_feature(max_points: usize) -> impl Strategy<Value = OwnedFeature<i32>> {
    (arb_feature_type(), arb_group_id(), vec(-1000i32..1000, 0..=max_points))
        .prop_map(|(t, g, points)| OwnedFeature::from_points(t, g, points))
}

/// One edit against a feature array. Indices and positions are raw and
/// get reduced modulo the current sizes when applied.
#[derive(Clone, Debug)]
pub enum Op {
    Append(OwnedFeature<i32>),
    Insert(usize, OwnedFeature<i32>),
    InsertMany(usize, Vec<OwnedFeature<i32>>),
    Erase(usize),
    EraseRange(usize, usize),
    PointInsert(usize, usize, Vec<i32>),
    PointErase(usize, usize, usize),
    SetGroup(usize, GroupId),
    Reverse,
    Rotate(usize),
    Share,
    Clear,
}

/// Edits weighted towards the size-changing ones.
pub fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_feature(6).prop_map(Op::Append),
        3 => (any::<usize>(), arb_feature(6)).prop_map(|(i, f)| Op::Insert(i, f)),
        1 => (any::<usize>(), vec(arb_feature(4), 0..4)).prop_map(|(i, fs)| Op::InsertMany(i, fs)),
        2 => any::<usize>().prop_map(Op::Erase),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        3 => (any::<usize>(), any::<usize>(), vec(-1000i32..1000, 0..4))
            .prop_map(|(i, p, pts)| Op::PointInsert(i, p, pts)),
        2 => (any::<usize>(), any::<usize>(), any::<usize>())
            .prop_map(|(i, a, b)| Op::PointErase(i, a, b)),
        1 => (any::<usize>(), arb_group_id()).prop_map(|(i, g)| Op::SetGroup(i, g)),
        1 => Just(Op::Reverse),
        1 => any::<usize>().prop_map(Op::Rotate),
        1 => Just(Op::Share),
        1 => Just(Op::Clear),
    ]
}
