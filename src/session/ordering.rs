// src/session/ordering.rs

use crate::models::Course;
use itertools::Itertools;

/// 启用的课程排在前面，禁用的排在后面；同一组内保持原有顺序。
pub fn order_courses(courses: &[Course]) -> Vec<Course> {
    courses.iter().cloned().sorted_by_key(|c| c.skip).collect()
}
