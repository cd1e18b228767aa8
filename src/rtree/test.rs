use crate::error::PlaneIndexError;
use crate::geometry::{BBox, Point};
use crate::rtree::index::NodeKind;
use crate::rtree::{RTree, RTreeBuilder, DEFAULT_NODE_CAPACITY};

/// Boxes (i, i - 10, i + 10, i) for i in -10..=10; index i + 10.
fn stepped_boxes() -> Vec<BBox<f64>> {
    (-10..=10)
        .map(|i| {
            let i = i as f64;
            BBox::new(i, i - 10., i + 10., i)
        })
        .collect()
}

/// Nested boxes (-i, 0, i, i) for i in 1..=10; index i - 1.
fn nested_boxes() -> Vec<BBox<f64>> {
    (1..=10)
        .map(|i| {
            let i = i as f64;
            BBox::new(-i, 0., i, i)
        })
        .collect()
}

fn scattered_boxes() -> Vec<BBox<f64>> {
    let corners: Vec<[i32; 2]> = vec![
        [54, 1],
        [97, 21],
        [65, 35],
        [33, 54],
        [95, 39],
        [54, 3],
        [53, 54],
        [84, 72],
        [33, 34],
        [43, 15],
        [52, 83],
        [81, 23],
        [1, 61],
        [38, 74],
        [11, 91],
        [24, 56],
        [90, 31],
        [25, 57],
        [46, 61],
        [29, 69],
        [49, 60],
        [4, 98],
        [71, 15],
        [60, 25],
        [38, 84],
        [52, 38],
        [94, 51],
        [13, 25],
        [77, 73],
        [88, 87],
        [6, 27],
        [58, 22],
        [53, 28],
        [27, 91],
        [96, 98],
        [93, 14],
        [22, 93],
        [45, 94],
        [18, 28],
        [35, 15],
        [19, 81],
        [20, 81],
        [67, 53],
        [43, 3],
        [47, 66],
        [48, 34],
        [46, 12],
        [32, 38],
        [43, 12],
        [39, 94],
        [88, 62],
        [66, 14],
        [84, 30],
        [72, 81],
        [41, 92],
        [26, 4],
        [6, 76],
        [47, 21],
        [57, 70],
        [71, 82],
        [50, 68],
        [96, 18],
        [40, 31],
        [78, 53],
        [71, 90],
        [32, 14],
        [55, 6],
        [32, 88],
        [62, 32],
        [21, 67],
        [73, 81],
        [44, 64],
        [29, 50],
        [70, 5],
        [6, 22],
        [68, 3],
        [11, 23],
        [20, 42],
        [21, 73],
        [63, 86],
        [9, 40],
        [99, 2],
        [99, 76],
        [56, 77],
        [83, 6],
        [21, 72],
        [78, 30],
        [75, 53],
        [41, 11],
        [95, 20],
        [30, 38],
        [96, 82],
        [65, 48],
        [33, 18],
        [87, 28],
        [10, 10],
        [40, 34],
        [10, 20],
        [47, 29],
        [46, 78],
    ];

    corners
        .into_iter()
        .enumerate()
        .map(|(index, [x, y])| {
            let (x, y) = (x as f64, y as f64);
            BBox::new(x, y, x + (index % 7) as f64, y + (index % 5) as f64)
        })
        .collect()
}

/// All indices sorted by (squared distance to `target`, index).
fn nearest_by_scan(boxes: &[BBox<f64>], target: &Point<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        boxes[a]
            .sq_dist_to_point(target)
            .partial_cmp(&boxes[b].sq_dist_to_point(target))
            .unwrap()
            .then_with(|| a.cmp(&b))
    });
    order
}

#[test]
fn nearest_on_stepped() {
    let tree = RTree::build(stepped_boxes()).unwrap();
    let target = Point::new(0., 0.);

    assert_eq!(tree.nearest_index(&target).unwrap(), 10);
    assert_eq!(
        tree.nearest_box(&target).unwrap(),
        BBox::new(0., -10., 10., 0.)
    );
    assert_eq!(
        tree.nearest_item(&target).unwrap(),
        (10, BBox::new(0., -10., 10., 0.))
    );

    // indices 9 and 11 tie at distance 1, so the lower index wins
    assert_eq!(tree.n_nearest_indices(2, &target).unwrap(), vec![10, 9]);
    assert_eq!(
        tree.n_nearest_indices(3, &target).unwrap(),
        vec![10, 9, 11]
    );
    assert_eq!(
        tree.n_nearest_boxes(2, &target).unwrap(),
        vec![BBox::new(0., -10., 10., 0.), BBox::new(-1., -11., 9., -1.)]
    );
}

#[test]
fn subsets_on_stepped() {
    let tree = RTree::build(stepped_boxes()).unwrap();

    assert_eq!(
        tree.find_subsets_indices(&BBox::new(0., -10., 10., 10.))
            .unwrap(),
        vec![10]
    );
    assert_eq!(
        tree.find_subsets(&BBox::new(0., -10., 10., 10.)).unwrap(),
        vec![BBox::new(0., -10., 10., 0.)]
    );
}

#[test]
fn supersets_on_stepped() {
    let tree = RTree::build(stepped_boxes()).unwrap();

    assert_eq!(
        tree.find_supersets_indices(&BBox::new(0., -10., 10., 0.))
            .unwrap(),
        vec![10]
    );
    assert_eq!(
        tree.find_supersets(&BBox::new(0., -10., 10., 0.)).unwrap(),
        vec![BBox::new(0., -10., 10., 0.)]
    );
}

#[test]
fn subsets_and_supersets_on_nested() {
    let tree = RTree::build(nested_boxes()).unwrap();

    let mut subsets = tree
        .find_subsets_indices(&BBox::new(-3., 0., 3., 3.))
        .unwrap();
    subsets.sort();
    assert_eq!(subsets, vec![0, 1, 2]);

    let mut supersets = tree
        .find_supersets_indices(&BBox::new(-8., 0., 8., 8.))
        .unwrap();
    supersets.sort();
    assert_eq!(supersets, vec![7, 8, 9]);
}

#[test]
fn nearest_matches_linear_scan() {
    let boxes = scattered_boxes();
    let tree = RTree::build_with_node_capacity(boxes.clone(), 4).unwrap();

    let mut targets = vec![
        Point::new(50., 50.),
        Point::new(0., 0.),
        Point::new(105., -3.),
        Point::new(33.5, 54.5),
    ];
    for bbox in &boxes {
        targets.push(Point::new(
            (bbox.min_x() + bbox.max_x()) / 2.,
            (bbox.min_y() + bbox.max_y()) / 2.,
        ));
    }

    for target in &targets {
        let expected = nearest_by_scan(&boxes, target)[0];
        assert_eq!(tree.nearest_index(target).unwrap(), expected);
    }
}

#[test]
fn n_nearest_matches_linear_scan() {
    let boxes = scattered_boxes();
    let tree = RTree::build_with_node_capacity(boxes.clone(), 4).unwrap();

    for target in [
        Point::new(50., 50.),
        Point::new(0., 0.),
        Point::new(96., 3.),
        Point::new(21., 72.),
    ] {
        let order = nearest_by_scan(&boxes, &target);
        for k in [1, 2, 3, 10, 99, 100, 250] {
            let result = tree.n_nearest_indices(k, &target).unwrap();
            assert_eq!(result.as_slice(), &order[..k.min(boxes.len())]);
        }
    }
}

#[test]
fn n_nearest_is_prefix_monotone() {
    let tree = RTree::build(scattered_boxes()).unwrap();
    let target = Point::new(47., 31.);

    let wide = tree.n_nearest_indices(30, &target).unwrap();
    for k in 1..30 {
        let narrow = tree.n_nearest_indices(k, &target).unwrap();
        assert_eq!(narrow.as_slice(), &wide[..k]);
    }
}

#[test]
fn box_centers_resolve_to_zero_distance() {
    let boxes = scattered_boxes();
    let tree = RTree::build(boxes.clone()).unwrap();

    for bbox in &boxes {
        let center = Point::new(
            (bbox.min_x() + bbox.max_x()) / 2.,
            (bbox.min_y() + bbox.max_y()) / 2.,
        );
        let found = tree.nearest_index(&center).unwrap();
        assert_eq!(boxes[found].sq_dist_to_point(&center), 0.);
    }
}

#[test]
fn intersection_search() {
    let boxes = scattered_boxes();
    let tree = RTree::build_with_node_capacity(boxes.clone(), 4).unwrap();
    let query = BBox::new(20., 30., 50., 70.);

    let result = tree.find_box_indices(&query).unwrap();

    for index in &result {
        if !boxes[*index].intersects(&query) {
            panic!("result box intersects the query");
        }
    }

    for (index, bbox) in boxes.iter().enumerate() {
        if !result.contains(&index) && bbox.intersects(&query) {
            panic!("intersecting box not in result");
        }
    }

    let mut deduped = result.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), result.len(), "no duplicates");
}

#[test]
fn subset_and_superset_search_match_predicates() {
    let boxes = scattered_boxes();
    let tree = RTree::build_with_node_capacity(boxes.clone(), 4).unwrap();

    for query in [
        BBox::new(20., 10., 60., 40.),
        BBox::new(0., 0., 100., 100.),
        BBox::new(46., 12., 49., 14.),
        BBox::new(33., 54., 33., 54.),
    ] {
        let subsets = tree.find_subsets_indices(&query).unwrap();
        for (index, bbox) in boxes.iter().enumerate() {
            assert_eq!(
                subsets.contains(&index),
                query.contains(bbox),
                "subset mismatch at {index} for {query:?}"
            );
        }

        let supersets = tree.find_supersets_indices(&query).unwrap();
        for (index, bbox) in boxes.iter().enumerate() {
            assert_eq!(
                supersets.contains(&index),
                bbox.contains(&query),
                "superset mismatch at {index} for {query:?}"
            );
        }
    }
}

#[test]
fn touching_query_boxes_intersect() {
    let tree = RTree::build(vec![
        BBox::new(0., 0., 1., 1.),
        BBox::new(3., 3., 4., 4.),
    ])
    .unwrap();

    // closed boundaries: a shared edge is an intersection
    assert_eq!(
        tree.find_box_indices(&BBox::new(1., 0., 2., 1.)).unwrap(),
        vec![0]
    );
    assert_eq!(
        tree.find_box_indices(&BBox::new(2., 0., 3., 3.)).unwrap(),
        vec![1]
    );
}

#[test]
fn parent_boxes_are_exact_unions() {
    let tree = RTree::build_with_node_capacity(scattered_boxes(), 4).unwrap();

    for node in &tree.nodes {
        if let NodeKind::Internal {
            children_start,
            children_len,
        } = node.kind
        {
            assert!(children_len as usize <= tree.node_capacity());
            let children = tree.children_of(children_start, children_len);
            let mut expected = tree.nodes[children[0] as usize].bbox;
            for &child in &children[1..] {
                expected = expected.merge(&tree.nodes[child as usize].bbox);
            }
            assert_eq!(node.bbox, expected);
        }
    }

    // the root covers every indexed box
    let root_bbox = tree.nodes[tree.root as usize].bbox;
    for bbox in tree.boxes() {
        assert!(root_bbox.contains(bbox));
    }
}

#[test]
fn leaves_share_a_depth_and_the_tree_is_shallow() {
    fn leaf_depths(tree: &RTree<f64>) -> Vec<usize> {
        let mut depths = vec![];
        let mut stack = vec![(tree.root, 0usize)];
        while let Some((node_index, depth)) = stack.pop() {
            match tree.nodes[node_index as usize].kind {
                NodeKind::Leaf { .. } => depths.push(depth),
                NodeKind::Internal {
                    children_start,
                    children_len,
                } => {
                    for &child in tree.children_of(children_start, children_len) {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }
        depths
    }

    // 100 leaves at capacity 4: 100 -> 25 -> 7 -> 2 -> root
    let tree = RTree::build_with_node_capacity(scattered_boxes(), 4).unwrap();
    let depths = leaf_depths(&tree);
    assert!(depths.iter().all(|&depth| depth == 4));

    // a level of at most `node_capacity` leaves hangs off a single root
    let tree = RTree::build(nested_boxes()).unwrap();
    let depths = leaf_depths(&tree);
    assert!(depths.iter().all(|&depth| depth == 1));

    // a single leaf is its own root
    let tree = RTree::build(vec![BBox::new(0., 0., 1., 1.)]).unwrap();
    assert_eq!(leaf_depths(&tree), vec![0]);
}

#[test]
fn single_box_tree() {
    let tree = RTree::build(vec![BBox::new(2., 2., 4., 4.)]).unwrap();

    assert_eq!(tree.nearest_index(&Point::new(0., 0.)).unwrap(), 0);
    assert_eq!(
        tree.find_subsets_indices(&BBox::new(0., 0., 5., 5.)).unwrap(),
        vec![0]
    );
    assert_eq!(
        tree.find_supersets_indices(&BBox::new(3., 3., 4., 4.))
            .unwrap(),
        vec![0]
    );
    assert_eq!(
        tree.find_box_indices(&BBox::new(4., 4., 9., 9.)).unwrap(),
        vec![0]
    );
}

#[test]
fn empty_tree_rejects_every_query() {
    let tree = RTree::<f64>::build(vec![]).unwrap();
    let target = Point::new(0., 0.);
    let query = BBox::new(0., 0., 1., 1.);

    assert_eq!(tree.nearest_index(&target), Err(PlaneIndexError::EmptyTree));
    assert_eq!(
        tree.n_nearest_indices(2, &target),
        Err(PlaneIndexError::EmptyTree)
    );
    assert_eq!(
        tree.find_subsets_indices(&query),
        Err(PlaneIndexError::EmptyTree)
    );
    assert_eq!(
        tree.find_supersets_indices(&query),
        Err(PlaneIndexError::EmptyTree)
    );
    assert_eq!(
        tree.find_box_indices(&query),
        Err(PlaneIndexError::EmptyTree)
    );
}

#[test]
fn invalid_arguments_are_rejected_before_traversal() {
    let tree = RTree::build(stepped_boxes()).unwrap();
    let target = Point::new(0., 0.);

    assert_eq!(
        tree.n_nearest_indices(0, &target),
        Err(PlaneIndexError::InvalidNeighborCount)
    );
    assert_eq!(
        tree.find_box_indices(&BBox::new(1., 0., 0., 1.)),
        Err(PlaneIndexError::InvalidBox)
    );
    assert_eq!(
        tree.find_subsets_indices(&BBox::new(0., 1., 1., 0.)),
        Err(PlaneIndexError::InvalidBox)
    );
}

#[test]
fn invalid_construction_is_rejected() {
    assert_eq!(
        RTree::build_with_node_capacity(stepped_boxes(), 1).unwrap_err(),
        PlaneIndexError::InvalidCapacity(1)
    );
    assert_eq!(
        RTreeBuilder::<f64>::new_with_node_capacity(0).unwrap_err(),
        PlaneIndexError::InvalidCapacity(0)
    );

    let mut builder = RTreeBuilder::new();
    assert_eq!(
        builder.add(1., 0., 0., 1.).unwrap_err(),
        PlaneIndexError::InvalidBox
    );

    assert_eq!(
        RTree::build(vec![BBox::new(0., 2., 1., 1.)]).unwrap_err(),
        PlaneIndexError::InvalidBox
    );
}

#[test]
fn build_is_deterministic() {
    let first = RTree::build_with_node_capacity(scattered_boxes(), 4).unwrap();
    let second = RTree::build_with_node_capacity(scattered_boxes(), 4).unwrap();

    assert_eq!(first, second);

    let target = Point::new(31., 68.);
    assert_eq!(
        first.n_nearest_indices(5, &target).unwrap(),
        second.n_nearest_indices(5, &target).unwrap()
    );
    assert_eq!(
        first
            .find_box_indices(&BBox::new(10., 10., 60., 60.))
            .unwrap(),
        second
            .find_box_indices(&BBox::new(10., 10., 60., 60.))
            .unwrap()
    );
}

#[test]
fn builder_matches_bulk_build() {
    let boxes = scattered_boxes();

    let mut builder = RTreeBuilder::new_with_node_capacity(DEFAULT_NODE_CAPACITY).unwrap();
    builder.reserve(boxes.len());
    for bbox in &boxes {
        builder.add_box(*bbox).unwrap();
    }
    let from_builder = builder.finish();

    assert_eq!(from_builder, RTree::build(boxes).unwrap());
}

#[test]
fn degenerate_boxes_are_indexed() {
    let boxes = vec![
        BBox::new(0., 0., 0., 0.),
        BBox::new(1., 1., 1., 3.),
        BBox::new(2., 0., 4., 0.),
    ];
    let tree = RTree::build(boxes).unwrap();

    assert_eq!(tree.nearest_index(&Point::new(0.2, 0.)).unwrap(), 0);
    let mut hits = tree.find_box_indices(&BBox::new(0., 0., 2., 1.)).unwrap();
    hits.sort();
    assert_eq!(hits, vec![0, 1, 2]);
    assert_eq!(
        tree.find_subsets_indices(&BBox::new(1., 1., 1., 3.)).unwrap(),
        vec![1]
    );
}
