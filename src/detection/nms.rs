// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 非极大值抑制 (按类别)

/// 后处理候选框 (原图坐标, 浮点)
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub class_id: usize,
    pub confidence: f32,
}

impl Candidate {
    pub fn area(&self) -> f32 {
        (self.xmax - self.xmin).max(0.0) * (self.ymax - self.ymin).max(0.0)
    }

    pub fn intersection_area(&self, another: &Candidate) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = self.xmax.min(another.xmax);
        let t = self.ymin.max(another.ymin);
        let b = self.ymax.min(another.ymax);
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn iou(&self, another: &Candidate) -> f32 {
        let inter = self.intersection_area(another);
        let union = self.area() + another.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// 按置信度降序保留框,同类别且 IOU 超过阈值的低分框被丢弃
pub fn non_max_suppression(xs: &mut Vec<Candidate>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence.total_cmp(&b1.confidence));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].class_id != xs[index].class_id {
                continue;
            }
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(xmin: f32, ymin: f32, size: f32, class_id: usize, confidence: f32) -> Candidate {
        Candidate {
            xmin,
            ymin,
            xmax: xmin + size,
            ymax: ymin + size,
            class_id,
            confidence,
        }
    }

    #[test]
    fn overlapping_boxes_of_same_class_collapse() {
        let mut xs = vec![
            cand(0.0, 0.0, 10.0, 3, 0.6),
            cand(1.0, 1.0, 10.0, 3, 0.9),
            cand(50.0, 50.0, 10.0, 3, 0.5),
        ];
        non_max_suppression(&mut xs, 0.5);
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].confidence, 0.9);
        assert_eq!(xs[1].confidence, 0.5);
    }

    #[test]
    fn different_classes_are_kept() {
        let mut xs = vec![cand(0.0, 0.0, 10.0, 0, 0.8), cand(0.0, 0.0, 10.0, 1, 0.7)];
        non_max_suppression(&mut xs, 0.5);
        assert_eq!(xs.len(), 2);
    }

    #[test]
    fn degenerate_boxes_do_not_divide_by_zero() {
        let a = cand(5.0, 5.0, 0.0, 0, 0.5);
        assert_eq!(a.iou(&a), 0.0);
    }
}
